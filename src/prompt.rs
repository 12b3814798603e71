//! Prompt templates sent to the hosted model.

use crate::knowledge::{Knowledge, ResolvedDrug};
use crate::session::SessionState;

/// How many trailing chat turns are replayed into the chat prompt.
const CHAT_HISTORY_WINDOW: usize = 3;

/// Builds the prescription-extraction prompt around the knowledge base.
pub fn scan_prompt(kb: &Knowledge) -> String {
    let mut prompt = String::from(
        "You are an elite pharmacist and handwriting specialist.\n\
         Your goal is accurate extraction. Avoid [UNREADABLE]: use the visible\n\
         letters plus the dosage to best-guess partial words.\n\n\
         ===== HANDWRITING HEURISTICS =====\n\
         - \"Syp\" = Syrup, \"Tab\" = Tablet, \"Cap\" = Capsule.\n\
         - Stems like \"Cal...\", \"Del...\", \"Lev...\" or \"Mef...\" are common\n\
           pediatric brands (Calpol, Delcon, Levolin, Meftal).\n\
         - Frequency: TDS = 3x daily, BD = 2x daily, Q6H = every 6 hours,\n\
           SOS = only when needed.\n\n",
    );

    if !kb.is_empty() {
        prompt.push_str(&kb.context_block());
        prompt.push_str("\n===== MASTER DATASET =====\n");
        prompt.push_str(&kb.master_dataset());
        prompt.push_str("\n\n");
    }

    prompt.push_str(
        "TASK:\n\
         1. Identify every medication. If messy, cross-check the visible letters\n\
            against the dosage (e.g. 250/5).\n\
         2. If \"4ml\" and \"250/5\" are both present, calculate the dose (200mg).\n\
         3. Always output the brand name and the generic name together.\n\n\
         Report for each medication:\n\
         1. **Medication Name**: standardized clinical name.\n\
         2. **Dosage/Strength**: e.g. 500mg, 1 tablet.\n\
         3. **Frequency & Timing**: e.g. BID (twice daily), before breakfast.\n\
         4. **Duration**: how many days or weeks.\n\
         5. **Purpose**: what it treats.\n\
         6. **Safety Warnings**: critical flags for the patient.\n\n\
         Example: if the image shows \"Pcm 500mg 1-0-1\", extract:\n\
         **Name**: Paracetamol\n\
         **Dosage**: 500mg\n\
         **Frequency**: twice a day (morning and night)\n\n\
         If a part is truly illegible, mark it [UNREADABLE].\n\
         Format the output with bold headers and bullet points.\n",
    );

    prompt
}

/// Builds the conversational prompt: assistant role, knowledge context, the
/// trailing history window, and the new user message.
pub fn chat_prompt(kb: &Knowledge, session: &SessionState, message: &str) -> String {
    let mut prompt = String::from("You are a clinical pharmacist and senior medical assistant.\n\n");

    if !kb.is_empty() {
        let abbreviations = serde_json::to_string(&kb.abbreviations).unwrap_or_default();
        let drug_database = serde_json::to_string(&kb.drug_database).unwrap_or_default();
        prompt.push_str(&format!(
            "===== MEDICAL KNOWLEDGE BASE (reference for accuracy) =====\n\
             - ABBREVIATIONS: {abbreviations}\n\
             - DRUG DATABASE: {drug_database}\n\n"
        ));
    }

    prompt.push_str(
        "GUIDELINES:\n\
         1. Reply in clean markdown text only, never raw JSON.\n\
         2. Be conversational: start with a short summary, then give details\n\
            in small sections.\n\
         3. For every drug mentioned cover: drug information (brand, purpose,\n\
            pharmacological type), a health analysis, nutrients & diet, and\n\
            home remedies - using the exact diet and home_remedies fields from\n\
            the knowledge base when the drug is recognized.\n\
         4. End with a standard clinical disclaimer.\n\n",
    );

    prompt.push_str(&format!("User message: {message}\n\n"));

    let history = session.recent_turns(CHAT_HISTORY_WINDOW);
    if history.is_empty() {
        prompt.push_str("Previous chat history: None\n");
    } else {
        prompt.push_str("Previous chat history:\n");
        for turn in history {
            prompt.push_str(&format!("{}: {}\n", turn.role, turn.content));
        }
    }

    prompt
}

/// Builds the symptom-analysis prompt.
pub fn symptom_prompt(symptoms: &str) -> String {
    format!(
        "I have these symptoms: {symptoms}. What could be the cause, and which\n\
         home remedies may help? You are an AI assistant, not a doctor: include\n\
         a reminder to see a doctor if symptoms persist or worsen."
    )
}

/// Builds the single-medicine report prompt, embedding database reference
/// data when fuzzy resolution found a match.
pub fn lookup_prompt(name: &str, resolved: Option<&ResolvedDrug<'_>>) -> String {
    let mut prompt = match resolved {
        Some(hit) => format!(
            "You are a pharmacist. Provide detailed information for the medicine\n\
             \"{}\" (interpreted from \"{name}\", {}% match).\n",
            hit.entry.name, hit.confidence
        ),
        None => format!(
            "You are a pharmacist. Provide detailed information for the medicine \"{name}\".\n"
        ),
    };

    if let Some(hit) = resolved {
        if !hit.entry.usage.is_empty() {
            prompt.push_str(&format!("Known usage: {}\n", hit.entry.usage));
        }
        if !hit.entry.restrictions.is_empty() {
            prompt.push_str(&format!("Known restrictions: {}\n", hit.entry.restrictions));
        }
    }

    prompt.push_str(
        "\nCover in markdown sections: what it does in plain English, clinical\n\
         purpose, side effects, restrictions (diabetes, heart disease,\n\
         pregnancy), age-specific dosage guidance, complementary diet, foods\n\
         to avoid, and common home remedies used alongside it.\n\
         If this is not a recognized medicine, say so plainly.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_kb() -> Knowledge {
        serde_json::from_str(
            r#"{
                "common_drugs": ["Paracetamol", "Cetirizine"],
                "abbreviations": {"TDS": "three times daily"},
                "drug_database": [{
                    "name": "Paracetamol",
                    "brand": "Calpol",
                    "usage": "Fever and mild pain",
                    "restrictions": "Max 4g/day for adults"
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn scan_prompt_embeds_knowledge_when_present() {
        let prompt = scan_prompt(&sample_kb());
        assert!(prompt.contains("HANDWRITING HEURISTICS"));
        assert!(prompt.contains("MASTER DATASET"));
        assert!(prompt.contains("Paracetamol, Cetirizine"));
        assert!(prompt.contains("TDS"));
    }

    #[test]
    fn scan_prompt_omits_dataset_for_empty_knowledge() {
        let prompt = scan_prompt(&Knowledge::default());
        assert!(prompt.contains("HANDWRITING HEURISTICS"));
        assert!(!prompt.contains("MASTER DATASET"));
        assert!(prompt.contains("**Medication Name**"));
    }

    #[test]
    fn chat_prompt_replays_only_the_trailing_window() {
        let mut session = SessionState::new();
        session.push_user("oldest question");
        session.push_assistant("oldest answer");
        session.push_user("recent question");
        session.push_assistant("recent answer");

        let prompt = chat_prompt(&Knowledge::default(), &session, "and now?");
        assert!(prompt.contains("User message: and now?"));
        assert!(prompt.contains("user: recent question"));
        assert!(prompt.contains("assistant: recent answer"));
        assert!(!prompt.contains("oldest question"));
    }

    #[test]
    fn chat_prompt_with_no_history_says_none() {
        let prompt = chat_prompt(&sample_kb(), &SessionState::new(), "hello");
        assert!(prompt.contains("Previous chat history: None"));
        assert!(prompt.contains("DRUG DATABASE"));
    }

    #[test]
    fn symptom_prompt_embeds_description() {
        let prompt = symptom_prompt("headache and mild fever");
        assert!(prompt.contains("headache and mild fever"));
        assert!(prompt.contains("see a doctor"));
    }

    #[test]
    fn lookup_prompt_uses_resolved_entry() {
        let kb = sample_kb();
        let hit = kb.resolve_name("Paracetamoll").unwrap();
        let prompt = lookup_prompt("Paracetamoll", Some(&hit));

        assert!(prompt.contains("\"Paracetamol\""));
        assert!(prompt.contains("Known usage: Fever and mild pain"));
        assert!(prompt.contains("Max 4g/day"));
    }

    #[test]
    fn lookup_prompt_without_resolution_keeps_the_raw_name() {
        let prompt = lookup_prompt("Obscurol", None);
        assert!(prompt.contains("\"Obscurol\""));
        assert!(!prompt.contains("interpreted from"));
    }
}
