//! Recommendation synthesis.
//!
//! Turns a validated [`EmissionsBreakdown`] into a prompt, sends it to Gemini
//! and coerces the reply into [`Recommendations`]. The reply is free text as
//! far as we are concerned, so parsing is fallible:
//!
//! 1. a JSON object (optionally inside a Markdown code fence) keyed by
//!    category, which is what the prompt asks for;
//! 2. failing that, category headings (`Travel:`, `**Energy**`, `## Food`)
//!    followed by bulleted lines.
//!
//! If either pass leaves a required category empty the whole reply is
//! rejected with [`RecommendationError::ResponseShape`].

use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::domain::{
    EmissionsBreakdown, RecommendationError, Recommendations, REQUIRED_CATEGORIES,
};
use crate::services::gemini::GeminiClient;

/// Tips shorter than this (in characters) are dropped.
const MIN_TIP_CHARS: usize = 3;

/// Words allowed after a category name in a heading ("Travel tips:").
const HEADING_SUFFIXES: [&str; 5] = ["recommendations", "recommendation", "tips", "suggestions", "advice"];

/// Produces recommendations through the Gemini API.
#[derive(Clone)]
pub struct Recommender {
    gemini: GeminiClient,
}

impl Recommender {
    pub fn new(gemini: GeminiClient) -> Self {
        Self { gemini }
    }

    pub fn is_configured(&self) -> bool {
        self.gemini.is_configured()
    }

    /// Ask the model for advice on `breakdown` and parse the answer.
    #[instrument(skip(self, breakdown), fields(total_emission = breakdown.total_emission))]
    pub async fn synthesize(
        &self,
        breakdown: &EmissionsBreakdown,
    ) -> Result<Recommendations, RecommendationError> {
        let prompt = build_prompt(breakdown);
        let text = self.gemini.generate_text(&prompt).await?;

        let recommendations = parse_recommendations(&text).map_err(|e| {
            warn!(error = %e, response_chars = text.len(), "Could not parse Gemini response");
            e
        })?;

        info!(
            travel = recommendations.travel.len(),
            energy = recommendations.energy.len(),
            food = recommendations.food.len(),
            shopping = recommendations.shopping.len(),
            "Recommendations generated"
        );

        Ok(recommendations)
    }
}

/// Build the prompt sent to the model for one breakdown.
pub fn build_prompt(breakdown: &EmissionsBreakdown) -> String {
    let (largest, _) = breakdown.largest_category();

    format!(
        "You are a sustainability coach. A user's estimated carbon footprint is:\n\
         - Travel: {travel:.2} kg CO2e\n\
         - Energy: {energy:.2} kg CO2e\n\
         - Food: {food:.2} kg CO2e\n\
         - Shopping: {shopping:.2} kg CO2e\n\
         - Total: {total:.2} kg CO2e\n\
         Their largest source of emissions is {largest}.\n\n\
         Suggest 2-3 short, specific, actionable ways to reduce emissions in each category, \
         giving the most attention to {largest}.\n\
         Respond with only a JSON object, without Markdown, in exactly this form:\n\
         {{\"travel\": [\"...\"], \"energy\": [\"...\"], \"food\": [\"...\"], \"shopping\": [\"...\"], \"general\": [\"...\"]}}",
        travel = breakdown.travel_emission,
        energy = breakdown.energy_emission,
        food = breakdown.food_emission,
        shopping = breakdown.shopping_emission,
        total = breakdown.total_emission,
        largest = largest,
    )
}

/// Coerce raw model text into the recommendation schema.
pub fn parse_recommendations(text: &str) -> Result<Recommendations, RecommendationError> {
    let tips = parse_json_object(text).unwrap_or_else(|| parse_sections(text));
    tips.finish()
}

// ============================================================================
// Collected tips
// ============================================================================

#[derive(Debug, Default)]
struct CategoryTips {
    travel: Vec<String>,
    energy: Vec<String>,
    food: Vec<String>,
    shopping: Vec<String>,
    general: Vec<String>,
}

impl CategoryTips {
    fn bucket(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Travel => &mut self.travel,
            Category::Energy => &mut self.energy,
            Category::Food => &mut self.food,
            Category::Shopping => &mut self.shopping,
            Category::General => &mut self.general,
        }
    }

    fn push(&mut self, category: Category, raw: &str) {
        if let Some(tip) = clean_tip(raw) {
            self.bucket(category).push(tip);
        }
    }

    fn finish(self) -> Result<Recommendations, RecommendationError> {
        let buckets = [&self.travel, &self.energy, &self.food, &self.shopping];
        let missing: Vec<&str> = REQUIRED_CATEGORIES
            .iter()
            .zip(buckets)
            .filter(|(_, tips)| tips.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.len() == REQUIRED_CATEGORIES.len() {
            return Err(RecommendationError::ResponseShape(
                "no recommendation categories found".to_string(),
            ));
        }
        if !missing.is_empty() {
            return Err(RecommendationError::ResponseShape(format!(
                "missing recommendations for: {}",
                missing.join(", ")
            )));
        }

        Ok(Recommendations {
            travel: self.travel,
            energy: self.energy,
            food: self.food,
            shopping: self.shopping,
            general: self.general,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Travel,
    Energy,
    Food,
    Shopping,
    General,
}

impl Category {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "travel" | "transport" | "transportation" => Some(Self::Travel),
            "energy" | "electricity" => Some(Self::Energy),
            "food" | "diet" => Some(Self::Food),
            "shopping" | "consumption" => Some(Self::Shopping),
            "general" | "overall" => Some(Self::General),
            _ => None,
        }
    }

    /// Like [`Category::from_label`], also accepting "Travel tips" style labels.
    fn from_heading(label: &str) -> Option<Self> {
        let mut words = label.split_whitespace();
        let category = Self::from_label(words.next()?)?;
        match (words.next(), words.next()) {
            (None, _) => Some(category),
            (Some(suffix), None) if HEADING_SUFFIXES.contains(&suffix.to_lowercase().as_str()) => {
                Some(category)
            }
            _ => None,
        }
    }
}

// ============================================================================
// Structured pass
// ============================================================================

fn parse_json_object(text: &str) -> Option<CategoryTips> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    let mut object: Map<String, Value> = serde_json::from_str(&text[start..=end]).ok()?;

    // Accept {"recommendations": {...}} as well as the bare object.
    if let Some(Value::Object(inner)) = object.remove("recommendations") {
        object = inner;
    }

    // An object with no category keys is not the answer; leave it to the heading pass.
    if !object.keys().any(|key| Category::from_label(key).is_some()) {
        return None;
    }

    let mut tips = CategoryTips::default();
    for (key, value) in &object {
        let Some(category) = Category::from_label(key) else {
            continue;
        };
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Value::String(tip) = item {
                        tips.push(category, tip);
                    }
                }
            }
            Value::String(block) => {
                for line in block.lines() {
                    tips.push(category, line);
                }
            }
            _ => {}
        }
    }

    Some(tips)
}

// ============================================================================
// Heading pass
// ============================================================================

fn parse_sections(text: &str) -> CategoryTips {
    let mut tips = CategoryTips::default();
    let mut current: Option<Category> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((category, rest)) = parse_heading(line) {
            current = Some(category);
            if !rest.is_empty() {
                tips.push(category, rest);
            }
            continue;
        }

        // Lines before the first heading are preamble.
        if let Some(category) = current {
            tips.push(category, line);
        }
    }

    tips
}

/// Recognize a heading line, returning its category and any text after the colon.
fn parse_heading(line: &str) -> Option<(Category, &str)> {
    let stripped = strip_list_marker(line.trim_start_matches('#').trim());

    match stripped.split_once(':') {
        Some((label, rest)) => {
            let category = Category::from_heading(&strip_emphasis(label))?;
            let rest = rest.trim().trim_start_matches(['*', '_']).trim();
            Some((category, rest))
        }
        None => Category::from_heading(&strip_emphasis(stripped)).map(|c| (c, "")),
    }
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "").trim().to_string()
}

/// Remove a leading bullet (`-`, `*`, `•`, `+`) or ordinal (`1.`, `2)`).
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start();

    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("• "))
        .or_else(|| line.strip_prefix("+ "))
        .or_else(|| line.strip_prefix("* "))
    {
        return rest.trim_start();
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }

    line
}

/// Normalize one suggestion; `None` if nothing usable is left.
fn clean_tip(raw: &str) -> Option<String> {
    let tip = strip_emphasis(strip_list_marker(raw.trim()));
    let tip = tip.trim().trim_matches('"').trim();

    if tip.chars().count() < MIN_TIP_CHARS || tip.ends_with(':') {
        return None;
    }
    Some(tip.to_string())
}
