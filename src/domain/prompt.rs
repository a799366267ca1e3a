//! Prompt enrichment for the generation API.

use crate::entities::{brand_kit::BrandKit, generation::GenerationType};

pub const QUALITY_SUFFIX: &str = ", 8k resolution, highly detailed, professional lighting";

pub fn type_suffix(generation_type: GenerationType) -> &'static str {
    match generation_type {
        GenerationType::BackgroundRemoval => ", on a transparent background, product photography style",
        GenerationType::ProductVariation => ", product photography, high quality, commercial style",
        GenerationType::CategoryBanner => ", banner design, marketing style, eye-catching",
        GenerationType::StyleTransfer => ", high quality, professional style",
    }
}

/// Builds the final prompt: user text, style text, brand colors, brand
/// guidelines, the type suffix and the quality suffix, in that order.
pub fn build_prompt(
    base_prompt: &str,
    style_text: &str,
    brand_kit: Option<&BrandKit>,
    generation_type: GenerationType,
) -> String {
    let mut prompt = String::with_capacity(base_prompt.len() + style_text.len() + 160);
    prompt.push_str(base_prompt);

    if !style_text.is_empty() {
        prompt.push_str(", ");
        prompt.push_str(style_text);
    }

    if let Some(kit) = brand_kit {
        if !kit.colors.is_empty() {
            prompt.push_str(", using brand colors: ");
            prompt.push_str(&kit.colors.join(", "));
        }
        if !kit.style_guidelines.is_empty() {
            prompt.push_str(", following style guidelines: ");
            prompt.push_str(&kit.style_guidelines);
        }
    }

    prompt.push_str(type_suffix(generation_type));
    prompt.push_str(QUALITY_SUFFIX);
    prompt
}
