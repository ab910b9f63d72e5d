//! System instruction and prompt construction for protocol generation.

use crate::library::Library;
use crate::schema::PROTOCOL_FIELDS;

/// Role and rules sent as the system instruction on every call.
pub const SYSTEM_INSTRUCTION: &str = "\
ROLE: Professional Architectural Photographer with expertise in multi-angle documentation.

OBJECTIVE: Analyze the reference architectural image and generate a precise camera override protocol
that will recreate the EXACT SAME building/structure from a different camera position and framing.

CRITICAL RULES:
1. BUILDING IDENTITY: The structure's design, materials, colors, and architectural character MUST remain 100% identical
2. CONSISTENCY ANCHORS: Extract and preserve key identifying features (materials, textures, colors, proportions)
3. SPATIAL UNDERSTANDING: Understand the 3D form to accurately predict how it appears from the new angle
4. NO HALLUCINATION: Do not invent architectural features not present in the reference
5. TECHNICAL ACCURACY: Apply the specified camera angle, framing, and lens characteristics precisely";

/// Temperature used when the configuration does not override it.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// What each protocol field must contain, in schema order.
const FIELD_GUIDE: [&str; 6] = [
    "Explicit command describing how the camera position changes from the reference to achieve the new angle.",
    "Detailed description of how the building's 3D form will appear from the new angle.",
    "List of specific architectural features that MUST remain identical.",
    "Precise description of what should be included in the frame based on the shot scale.",
    "Explanation of how the specified lens will render the scene.",
    "A complete, production-ready technical prompt that synthesizes all above elements.",
];

/// The four camera parameters a prompt is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotSelection {
    pub angle: String,
    pub scale: String,
    pub lens: String,
    pub aspect_ratio: String,
}

/// Build the user prompt for one angle/scale/lens/ratio combination.
///
/// Keys missing from the catalog contribute an empty description.
pub fn build_prompt(selection: &ShotSelection, library: &Library) -> String {
    let describe = |table: &crate::library::Catalog, key: &str| {
        table
            .get(key)
            .map(|e| e.prompt_text.clone())
            .unwrap_or_default()
    };

    let mut lines: Vec<String> = vec![
        "REFERENCE IMAGE ANALYSIS TASK:".into(),
        "You are viewing an architectural photograph. Your task is to generate a camera override protocol".into(),
        "that will recreate this EXACT structure from a different viewpoint.".into(),
        String::new(),
        "NEW CAMERA SPECIFICATIONS:".into(),
        String::new(),
        "1. CAMERA ANGLE OVERRIDE:".into(),
        describe(&library.camera_angles, &selection.angle),
        String::new(),
        "2. SHOT SCALE/FRAMING:".into(),
        describe(&library.shot_scales, &selection.scale),
        String::new(),
        "3. LENS OPTICAL CHARACTER:".into(),
        library.lens_prompt(&selection.lens).to_string(),
        String::new(),
        format!("4. ASPECT RATIO: {}", selection.aspect_ratio),
        String::new(),
        "REQUIRED OUTPUT STRUCTURE (JSON):".into(),
        "{".into(),
    ];

    let last = PROTOCOL_FIELDS.len() - 1;
    for (i, (field, guide)) in PROTOCOL_FIELDS.iter().zip(FIELD_GUIDE).enumerate() {
        let comma = if i == last { "" } else { "," };
        lines.push(format!("  \"{field}\": \"{guide}\"{comma}"));
    }

    lines.extend([
        "}".into(),
        String::new(),
        "CONSISTENCY REMINDER: The building's architectural identity must be preserved with 90-95% fidelity.".into(),
        "Only the camera position, framing, and optical rendering change - NOT the building design itself.".into(),
    ]);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::{Catalog, CatalogEntry};

    fn library() -> Library {
        Library {
            camera_angles: Catalog::from_entries([(
                "aerial",
                CatalogEntry::new("Aerial", "Drone view from 60m"),
            )]),
            shot_scales: Catalog::from_entries([(
                "full_shot",
                CatalogEntry::new("Full", "Entire building in frame"),
            )]),
            lenses: Catalog::from_entries([(
                "24mm_wide",
                CatalogEntry::new("24mm", "Wide with mild distortion"),
            )]),
            ..Library::default()
        }
    }

    fn selection(angle: &str) -> ShotSelection {
        ShotSelection {
            angle: angle.to_string(),
            scale: "full_shot".to_string(),
            lens: "24mm_wide".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }

    #[test]
    fn test_prompt_embeds_catalog_text() {
        let prompt = build_prompt(&selection("aerial"), &library());
        assert!(prompt.contains("1. CAMERA ANGLE OVERRIDE:\nDrone view from 60m"));
        assert!(prompt.contains("2. SHOT SCALE/FRAMING:\nEntire building in frame"));
        assert!(prompt.contains("3. LENS OPTICAL CHARACTER:\nWide with mild distortion"));
        assert!(prompt.contains("4. ASPECT RATIO: 16:9"));
    }

    #[test]
    fn test_prompt_lists_every_protocol_field() {
        let prompt = build_prompt(&selection("aerial"), &library());
        for field in PROTOCOL_FIELDS {
            assert!(prompt.contains(&format!("\"{field}\":")), "missing {field}");
        }
        assert!(prompt.contains("synthesizes all above elements.\"\n}"));
    }

    #[test]
    fn test_unknown_key_yields_empty_description() {
        let prompt = build_prompt(&selection("satellite"), &library());
        assert!(prompt.contains("1. CAMERA ANGLE OVERRIDE:\n\n\n2. SHOT SCALE"));
    }

    #[test]
    fn test_system_instruction_has_five_rules() {
        assert!(SYSTEM_INSTRUCTION.starts_with("ROLE: Professional Architectural Photographer"));
        assert!(SYSTEM_INSTRUCTION.contains("5. TECHNICAL ACCURACY"));
        assert!(!SYSTEM_INSTRUCTION.ends_with('\n'));
    }
}
