use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Stable integer key of a problem within a dataset
pub type RowId = i64;

/// Column holding the row identifier. Datasets without it fall back to the
/// 0-based position of the row in the file.
pub const ROW_ID_FIELD: &str = "No";

pub const PROBLEM_FIELDS: &[&str] = &["Soal_x", "Soal_y", "Soal"];
pub const STUDENT_ANSWER_FIELDS: &[&str] = &["Jawaban_Salah", "Student_Answer", "student_error"];
pub const CORRECT_ANSWER_FIELDS: &[&str] = &["Jawaban", "correct_answer"];
pub const GENERATED_FEEDBACK_FIELDS: &[&str] = &["Generated_Feedback"];
pub const FEEDBACK_PAYLOAD_FIELD: &str = "dict_generated_feedback";

pub const KNOWLEDGE_LEVEL_FIELD: &str = "SPK";
pub const MISTAKE_LEVEL_FIELD: &str = "SAL";
pub const FEEDBACK_TYPE_FIELD: &str = "Final_Feedback_Type";

/// Returns the first present, non-blank value among `names`, in priority
/// order. Missing everywhere resolves to an empty string.
pub fn resolve_field(record: &HashMap<String, String>, names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| record.get(*name))
        .find(|value| !value.trim().is_empty())
        .cloned()
        .unwrap_or_default()
}

fn optional_field(record: &HashMap<String, String>, name: &str) -> Option<String> {
    record
        .get(name)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

/// Structured feedback payload carried by the `dict_generated_feedback` column
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedbackPayload {
    #[serde(rename = "Feedback")]
    pub feedback: String,
}

impl FeedbackPayload {
    /// Parses a mapping with a string `Feedback` key. Dataset exports write
    /// the cell either as a JSON object or as a Python dict literal
    /// (`{'Feedback': '...'}`); both are accepted, nothing looser is.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(raw).or_else(|json_error| {
            python_literal_to_json(raw)
                .and_then(|converted| serde_json::from_str::<Self>(&converted).ok())
                .ok_or(json_error)
        })
    }
}

/// Rewrites a Python literal (quoted strings, `True`, `False`, `None`) as
/// JSON text. Returns `None` on an unterminated string; any other syntax
/// problem is left for the JSON parser to reject.
fn python_literal_to_json(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let decoded = python_string_body(&mut chars, c)?;
                out.push_str(&serde_json::to_string(&decoded).ok()?);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            other => out.push(other),
        }
    }

    Some(out)
}

/// Reads up to the closing `quote`, decoding Python escape sequences
fn python_string_body(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
) -> Option<String> {
    let mut value = String::new();

    loop {
        match chars.next()? {
            c if c == quote => return Some(value),
            '\\' => {
                let escaped = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\\' | '\'' | '"' => value.push(escaped),
                    'x' => value.push(hex_escape(chars, 2)?),
                    'u' => value.push(hex_escape(chars, 4)?),
                    'U' => value.push(hex_escape(chars, 8)?),
                    // Unknown escapes keep the backslash, as Python does
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            }
            c => value.push(c),
        }
    }
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return None;
    }
    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
}

/// One problem instance shown to teachers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRow {
    pub row_id: RowId,

    /// 0-based position of the row in its dataset file
    pub position: usize,

    pub problem: String,
    pub correct_answer: String,
    pub student_answer: String,

    /// Raw `Generated_Feedback` column, stored with every annotation
    pub generated_feedback: String,

    /// Text shown as the tutor's message. Taken from the structured payload
    /// when the dataset has one.
    pub feedback_text: String,

    /// Student knowledge level (SPK)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_level: Option<String>,

    /// Student mistake level (SAL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mistake_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_type: Option<String>,
}

impl ProblemRow {
    /// Builds a row from a raw CSV record keyed by column name.
    /// `payload` is the already-validated structured feedback, if any.
    pub fn from_record(
        row_id: RowId,
        position: usize,
        record: &HashMap<String, String>,
        payload: Option<FeedbackPayload>,
    ) -> Self {
        let generated_feedback = resolve_field(record, GENERATED_FEEDBACK_FIELDS);
        let feedback_text = payload
            .map(|p| p.feedback)
            .unwrap_or_else(|| generated_feedback.clone());

        Self {
            row_id,
            position,
            problem: resolve_field(record, PROBLEM_FIELDS),
            correct_answer: resolve_field(record, CORRECT_ANSWER_FIELDS),
            student_answer: resolve_field(record, STUDENT_ANSWER_FIELDS),
            generated_feedback,
            feedback_text,
            knowledge_level: optional_field(record, KNOWLEDGE_LEVEL_FIELD),
            mistake_level: optional_field(record, MISTAKE_LEVEL_FIELD),
            feedback_type: optional_field(record, FEEDBACK_TYPE_FIELD),
        }
    }
}

/// Fixed set of dataset identities the deployment serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetProfile {
    /// Generated feedback with and without retrieval augmentation
    Rag,
    /// Feedback split by dataset language
    Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub name: &'static str,
    pub file_name: &'static str,
    pub description: &'static str,
}

const RAG_DATASETS: &[DatasetDescriptor] = &[
    DatasetDescriptor {
        name: "RAG4O",
        file_name: "combined_data_generated_feedback_rag_gpt4o.csv",
        description: "RAG + GPT-4o",
    },
    DatasetDescriptor {
        name: "RAG5N",
        file_name: "combined_data_generated_feedback_ragGPT-5-nano.csv",
        description: "RAG + GPT-5-nano",
    },
    DatasetDescriptor {
        name: "4O",
        file_name: "combined_data_generated_feedback_GPT4o.csv",
        description: "GPT-4o",
    },
    DatasetDescriptor {
        name: "5N",
        file_name: "combined_data_generated_feedback_GPT-5-nano.csv",
        description: "GPT-5-nano",
    },
];

const LANGUAGE_DATASETS: &[DatasetDescriptor] = &[
    DatasetDescriptor {
        name: "Indonesian Dataset (GPT-5-nano)",
        file_name: "combined_data_generated_feedback_GPT-5-nano.csv",
        description: "Indonesian problems, feedback generated by GPT-5-nano",
    },
    DatasetDescriptor {
        name: "English Dataset (GPT-4o)",
        file_name: "combined_data_generated_feedback_english_GPT4o.csv",
        description: "English problems, feedback generated by GPT-4o",
    },
];

impl DatasetProfile {
    pub fn descriptors(self) -> &'static [DatasetDescriptor] {
        match self {
            DatasetProfile::Rag => RAG_DATASETS,
            DatasetProfile::Language => LANGUAGE_DATASETS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetProfile::Rag => "rag",
            DatasetProfile::Language => "language",
        }
    }
}

impl Default for DatasetProfile {
    fn default() -> Self {
        DatasetProfile::Rag
    }
}

impl fmt::Display for DatasetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rag" => Ok(DatasetProfile::Rag),
            "language" => Ok(DatasetProfile::Language),
            other => Err(format!("Unknown dataset profile: {}", other)),
        }
    }
}

/// Catalog entry returned by `GET /api/v1/datasets`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub name: String,
    pub description: String,
    pub row_count: usize,
    /// True when the dataset file was missing and sample rows are served
    pub sample: bool,
}
