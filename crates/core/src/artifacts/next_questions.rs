use serde::{Deserialize, Serialize};

use crate::flow::definition::Audience;
use crate::lang::{question_for, Dialect};

const MAX_QUESTIONS: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FollowUpQuestion {
    pub field: String,
    pub question: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NextQuestionsData {
    pub questions: Vec<FollowUpQuestion>,
}

/// One question per missing field, phrased for the audience and dialect,
/// capped at five so the conversation never turns into a form.
pub fn build(missing_fields: &[String], audience: Audience, dialect: Dialect) -> NextQuestionsData {
    let questions = missing_fields
        .iter()
        .take(MAX_QUESTIONS)
        .map(|field| FollowUpQuestion {
            field: field.clone(),
            question: question_for(field, audience, dialect),
        })
        .collect();

    NextQuestionsData { questions }
}

#[cfg(test)]
mod tests {
    use crate::artifacts::next_questions::build;
    use crate::flow::definition::Audience;
    use crate::lang::Dialect;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn builds_one_question_per_missing_field() {
        let missing = fields(&["crop", "hectares"]);
        let data = build(&missing, Audience::Farmer, Dialect::English);

        assert_eq!(data.questions.len(), 2);
        assert_eq!(data.questions[0].field, "crop");
        assert_eq!(data.questions[0].question, "What crop are you planting this season?");
        assert_eq!(data.questions[1].question, "How many hectares is your farm?");
    }

    #[test]
    fn output_is_capped_at_five_questions() {
        let missing = fields(&[
            "crop",
            "hectares",
            "province",
            "municipality",
            "irrigation",
            "labor_cost",
            "harvest_volume",
        ]);
        let data = build(&missing, Audience::LoanOfficer, Dialect::English);
        assert_eq!(data.questions.len(), 5);
    }

    #[test]
    fn filipino_farmer_questions_use_the_polite_register() {
        let missing = fields(&["hectares"]);
        let data = build(&missing, Audience::Farmer, Dialect::Filipino);
        assert_eq!(data.questions[0].question, "Ilan pong ektarya ang inyong sakahan?");
    }

    #[test]
    fn no_missing_fields_means_no_questions() {
        let data = build(&[], Audience::Farmer, Dialect::English);
        assert!(data.questions.is_empty());
    }
}
