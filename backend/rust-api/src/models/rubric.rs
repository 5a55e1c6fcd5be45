use serde::Serialize;

/// The six fixed rating dimensions applied to a piece of generated feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RubricDimension {
    Relevancy,
    Accuracy,
    Motivation,
    Demotivation,
    Guidance,
    ToneStyle,
}

const LOW_MEDIUM_HIGH: &[(i32, &str)] = &[(1, "Low"), (2, "Medium"), (3, "High")];

impl RubricDimension {
    pub const ALL: [RubricDimension; 6] = [
        RubricDimension::Relevancy,
        RubricDimension::Accuracy,
        RubricDimension::Motivation,
        RubricDimension::Demotivation,
        RubricDimension::Guidance,
        RubricDimension::ToneStyle,
    ];

    /// Field name used in requests and stored records
    pub fn key(self) -> &'static str {
        match self {
            RubricDimension::Relevancy => "relevancy",
            RubricDimension::Accuracy => "accuracy",
            RubricDimension::Motivation => "motivation",
            RubricDimension::Demotivation => "demotivation",
            RubricDimension::Guidance => "guidance",
            RubricDimension::ToneStyle => "tone_style",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RubricDimension::Relevancy => "Relevancy with Formative Feedback",
            RubricDimension::Accuracy => "Accuracy",
            RubricDimension::Motivation => "Motivation",
            RubricDimension::Demotivation => "Demotivation",
            RubricDimension::Guidance => "Guidance",
            RubricDimension::ToneStyle => "Tone and Style",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            RubricDimension::Relevancy => {
                "How relevant is the feedback to formative assessment principles?"
            }
            RubricDimension::Accuracy => "Is the feedback mathematically/factually accurate?",
            RubricDimension::Motivation => "How motivating is the feedback for the student?",
            RubricDimension::Demotivation => {
                "How demotivating is the feedback? (Lower is better)"
            }
            RubricDimension::Guidance => "How well does the feedback guide the student?",
            RubricDimension::ToneStyle => {
                "How appropriate is the tone and style of the feedback?"
            }
        }
    }

    /// Allowed values with their labels, ascending
    pub fn scale(self) -> &'static [(i32, &'static str)] {
        match self {
            RubricDimension::Relevancy => {
                &[(1, "Very Low"), (2, "Low"), (3, "High"), (4, "Very High")]
            }
            RubricDimension::Accuracy => &[(0, "Incorrect"), (1, "Correct")],
            RubricDimension::Motivation
            | RubricDimension::Demotivation
            | RubricDimension::Guidance => LOW_MEDIUM_HIGH,
            RubricDimension::ToneStyle => {
                &[(1, "Poor"), (2, "Fair"), (3, "Good"), (4, "Excellent")]
            }
        }
    }

    pub fn min(self) -> i32 {
        self.scale()[0].0
    }

    pub fn max(self) -> i32 {
        self.scale()[self.scale().len() - 1].0
    }
}

/// Feedback categories annotators are asked to keep in mind
pub const FEEDBACK_TYPES: &[(&str, &str)] = &[
    (
        "Response-contingent",
        "Detailed comments that highlight the student's specific response. May explain why the correct answer is correct and the wrong one is wrong, without formal error analysis.",
    ),
    (
        "Topic-contingent",
        "Detailed feedback giving the student information about the topic being studied. This can mean reteaching the material.",
    ),
    (
        "Correct response",
        "Tells the student the correct answer to the problem without additional information.",
    ),
    (
        "Verification",
        "Tells the student whether their response is correct, such as right/wrong or an overall percentage correct.",
    ),
    (
        "Try-again",
        "Tells the student they answered incorrectly and allows one or more further attempts.",
    ),
];

#[derive(Debug, Serialize)]
pub struct ScaleOption {
    pub value: i32,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DimensionDescription {
    pub key: &'static str,
    pub title: &'static str,
    pub help: &'static str,
    pub options: Vec<ScaleOption>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackTypeDescription {
    pub name: &'static str,
    pub definition: &'static str,
}

/// Everything a client needs to render the rating form
#[derive(Debug, Serialize)]
pub struct RubricResponse {
    pub dimensions: Vec<DimensionDescription>,
    pub feedback_types: Vec<FeedbackTypeDescription>,
}

impl RubricResponse {
    pub fn build() -> Self {
        let dimensions = RubricDimension::ALL
            .iter()
            .map(|dimension| DimensionDescription {
                key: dimension.key(),
                title: dimension.title(),
                help: dimension.help(),
                options: dimension
                    .scale()
                    .iter()
                    .map(|&(value, label)| ScaleOption { value, label })
                    .collect(),
            })
            .collect();

        let feedback_types = FEEDBACK_TYPES
            .iter()
            .map(|&(name, definition)| FeedbackTypeDescription { name, definition })
            .collect();

        Self {
            dimensions,
            feedback_types,
        }
    }
}
