//! Bilingual (English / Filipino) literal tables used by the engine.
//!
//! Every piece of canned language lives here, keyed by dialect and concept,
//! so adding a language touches this file only and never the flow runtime.

use serde::{Deserialize, Serialize};

use crate::flow::definition::Audience;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fil")]
    Filipino,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Filipino => "fil",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "en" | "english" => Some(Self::English),
            "fil" | "tl" | "filipino" | "tagalog" => Some(Self::Filipino),
            _ => None,
        }
    }
}

/// Affirmative/negative keyword sets for boolean slot capture. Both languages
/// live in one set: farmers mix English and Filipino within a single reply.
pub const AFFIRMATIVE_WORDS: &[&str] =
    &["yes", "yeah", "yep", "yup", "sure", "correct", "oo", "opo", "sige", "tama", "totoo"];

pub const NEGATIVE_WORDS: &[&str] =
    &["no", "nope", "none", "hindi", "wala", "ayaw", "dili"];

struct QuestionTemplate {
    concepts: &'static [&'static str],
    en_officer: &'static str,
    en_farmer: &'static str,
    fil_officer: &'static str,
    fil_farmer: &'static str,
}

const QUESTION_TEMPLATES: &[QuestionTemplate] = &[
    QuestionTemplate {
        concepts: &["crop", "pananim"],
        en_officer: "What crop does the farmer plant this season?",
        en_farmer: "What crop are you planting this season?",
        fil_officer: "Anong pananim ng magsasaka ngayong season?",
        fil_farmer: "Ano po ang itinatanim ninyo ngayong season?",
    },
    QuestionTemplate {
        concepts: &["hectare", "area", "size", "lupa"],
        en_officer: "How many hectares is the farm?",
        en_farmer: "How many hectares is your farm?",
        fil_officer: "Ilang ektarya ang sakahan?",
        fil_farmer: "Ilan pong ektarya ang inyong sakahan?",
    },
    QuestionTemplate {
        concepts: &["province", "probinsya"],
        en_officer: "Which province is the farm in?",
        en_farmer: "Which province is your farm in?",
        fil_officer: "Saang probinsya matatagpuan ang sakahan?",
        fil_farmer: "Saan pong probinsya ang inyong sakahan?",
    },
    QuestionTemplate {
        concepts: &["municipality", "location", "bayan", "city"],
        en_officer: "Which municipality or city is the farm in?",
        en_farmer: "Which municipality or city is your farm in?",
        fil_officer: "Saang bayan o lungsod ang sakahan?",
        fil_farmer: "Saan pong bayan o lungsod ang inyong sakahan?",
    },
    QuestionTemplate {
        concepts: &["irrigation", "water", "patubig"],
        en_officer: "Is the farm irrigated or rainfed?",
        en_farmer: "Is your farm irrigated or rainfed?",
        fil_officer: "May patubig ba ang sakahan o sahod-ulan?",
        fil_farmer: "May patubig po ba kayo o sahod-ulan?",
    },
    QuestionTemplate {
        concepts: &["labor", "worker"],
        en_officer: "How much does the farmer spend on labor per season?",
        en_farmer: "How much do you spend on labor per season?",
        fil_officer: "Magkano ang gastos ng magsasaka sa trabahador kada season?",
        fil_farmer: "Magkano po ang gastos ninyo sa trabahador kada season?",
    },
    QuestionTemplate {
        concepts: &["harvest", "yield", "ani"],
        en_officer: "What was the last harvest volume?",
        en_farmer: "How much did you harvest last season?",
        fil_officer: "Magkano ang huling ani?",
        fil_farmer: "Magkano po ang naani ninyo noong nakaraang season?",
    },
    QuestionTemplate {
        concepts: &["income", "kita"],
        en_officer: "What is the farmer's income from the last cropping?",
        en_farmer: "How much did you earn from the last cropping?",
        fil_officer: "Magkano ang kita ng magsasaka noong huling taniman?",
        fil_farmer: "Magkano po ang kinita ninyo noong huling taniman?",
    },
];

/// Pick a question for a missing field by substring match on the field name.
/// Unknown fields fall back to a generic prompt that names the field.
pub fn question_for(field: &str, audience: Audience, dialect: Dialect) -> String {
    let needle = field.to_ascii_lowercase();
    for template in QUESTION_TEMPLATES {
        if template.concepts.iter().any(|concept| needle.contains(concept)) {
            let question = match (dialect, audience) {
                (Dialect::English, Audience::LoanOfficer) => template.en_officer,
                (Dialect::English, Audience::Farmer) => template.en_farmer,
                (Dialect::Filipino, Audience::LoanOfficer) => template.fil_officer,
                (Dialect::Filipino, Audience::Farmer) => template.fil_farmer,
            };
            return question.to_owned();
        }
    }

    match dialect {
        Dialect::English => format!("Can you tell me about: {field}?"),
        Dialect::Filipino => format!("Maaari po bang sabihin ninyo: {field}?"),
    }
}

/// Deterministic reply used when the language backend fails or times out.
/// The turn's state progress has already been persisted by then.
pub fn fallback_reply(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::English => {
            "Noted, thank you. I had trouble composing a full reply just now, \
             but your answers are saved. Please continue."
        }
        Dialect::Filipino => {
            "Salamat po, naitala ko na ang inyong sagot. Nagkaproblema lang po ako \
             sa pagbuo ng kumpletong tugon, pero tuloy lang po tayo."
        }
    }
}

pub fn dialect_instruction(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::English => "Reply in plain English.",
        Dialect::Filipino => "Reply in conversational Filipino (Tagalog), polite po/opo register.",
    }
}
