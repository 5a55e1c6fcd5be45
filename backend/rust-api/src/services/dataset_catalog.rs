use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::dataset::{
    FeedbackPayload, FEEDBACK_PAYLOAD_FIELD, ROW_ID_FIELD,
};
use crate::models::{DatasetProfile, DatasetSummary, ProblemRow, RowId};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {dataset} from {path}: {source}")]
    Io {
        dataset: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in dataset {dataset}: {source}")]
    Csv {
        dataset: String,
        #[source]
        source: csv::Error,
    },
    #[error("dataset {dataset}, line {line}: invalid row id {value:?}")]
    InvalidRowId {
        dataset: String,
        line: usize,
        value: String,
    },
    #[error("dataset {dataset}: row id {row_id} appears more than once")]
    DuplicateRowId { dataset: String, row_id: RowId },
    #[error("dataset {dataset}, row {row_id}: malformed feedback payload: {source}")]
    MalformedFeedback {
        dataset: String,
        row_id: RowId,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
}

/// Immutable, named, ordered collection of problem rows
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    description: String,
    rows: Vec<ProblemRow>,
    by_id: HashMap<RowId, usize>,
    sample: bool,
}

impl Dataset {
    /// Parses a CSV export. The first line holds column names.
    pub fn from_reader<R: Read>(
        name: &str,
        description: &str,
        reader: R,
    ) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let csv_error = |source: csv::Error| DatasetError::Csv {
            dataset: name.to_string(),
            source,
        };

        let headers = csv_reader.headers().map_err(csv_error)?.clone();
        let mut records = Vec::new();
        for result in csv_reader.records() {
            let record = result.map_err(csv_error)?;
            records.push(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(column, value)| (column.to_string(), value.to_string()))
                    .collect::<HashMap<String, String>>(),
            );
        }

        Self::from_records(name, description, records)
    }

    /// Builds a dataset from column-keyed records, in file order.
    pub fn from_records(
        name: &str,
        description: &str,
        records: Vec<HashMap<String, String>>,
    ) -> Result<Self, DatasetError> {
        let mut rows = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let row_id = match record.get(ROW_ID_FIELD) {
                Some(raw) => parse_row_id(raw).ok_or_else(|| DatasetError::InvalidRowId {
                    dataset: name.to_string(),
                    // header is line 1
                    line: position + 2,
                    value: raw.clone(),
                })?,
                None => position as RowId,
            };

            let payload = match record
                .get(FEEDBACK_PAYLOAD_FIELD)
                .filter(|raw| !raw.trim().is_empty())
            {
                Some(raw) => Some(FeedbackPayload::parse(raw).map_err(|source| {
                    DatasetError::MalformedFeedback {
                        dataset: name.to_string(),
                        row_id,
                        source,
                    }
                })?),
                None => None,
            };

            if by_id.insert(row_id, position).is_some() {
                return Err(DatasetError::DuplicateRowId {
                    dataset: name.to_string(),
                    row_id,
                });
            }
            rows.push(ProblemRow::from_record(row_id, position, record, payload));
        }

        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            rows,
            by_id,
            sample: false,
        })
    }

    pub fn load(name: &str, description: &str, path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
            dataset: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(name, description, std::io::BufReader::new(file))
    }

    /// Three placeholder rows, served when the dataset file is missing
    pub fn sample(name: &str, description: &str) -> Self {
        let answers = [("17", "15"), ("25", "20"), ("30", "28")];
        let levels = ["High", "Medium", "Low"];
        let feedback_types = ["Try again", "Hint", "Explanation"];

        let rows: Vec<ProblemRow> = (0..3usize)
            .map(|position| {
                let (correct, wrong) = answers[position];
                let record = HashMap::from([
                    ("Soal".to_string(), format!("Sample problem {} for {}", position + 1, name)),
                    ("Jawaban".to_string(), correct.to_string()),
                    ("Jawaban_Salah".to_string(), wrong.to_string()),
                    ("SPK".to_string(), levels[position].to_string()),
                    ("SAL".to_string(), levels[position].to_string()),
                    (
                        "Final_Feedback_Type".to_string(),
                        feedback_types[position].to_string(),
                    ),
                    (
                        "Generated_Feedback".to_string(),
                        format!("Sample feedback {}", position + 1),
                    ),
                ]);
                let payload = FeedbackPayload {
                    feedback: "Sample feedback text".to_string(),
                };
                ProblemRow::from_record(position as RowId + 1, position, &record, Some(payload))
            })
            .collect();

        let by_id = rows
            .iter()
            .enumerate()
            .map(|(position, row)| (row.row_id, position))
            .collect();

        Self {
            name: name.to_string(),
            description: description.to_string(),
            rows,
            by_id,
            sample: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_sample(&self) -> bool {
        self.sample
    }

    pub fn row(&self, row_id: RowId) -> Option<&ProblemRow> {
        self.by_id.get(&row_id).map(|&position| &self.rows[position])
    }

    pub fn row_ids(&self) -> impl Iterator<Item = RowId> + '_ {
        self.rows.iter().map(|row| row.row_id)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            row_count: self.rows.len(),
            sample: self.sample,
        }
    }
}

/// Accepts integral values, including float-formatted ones such as `12.0`
fn parse_row_id(raw: &str) -> Option<RowId> {
    let raw = raw.trim();
    raw.parse::<RowId>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && value.fract() == 0.0)
            .map(|value| value as RowId)
    })
}

/// The fixed set of datasets served by this deployment
#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    profile: DatasetProfile,
    datasets: Vec<Arc<Dataset>>,
}

impl DatasetCatalog {
    /// Loads every dataset of `profile` from `dir`. A missing file is
    /// replaced by sample rows; any other read or parse failure is fatal.
    pub fn load(profile: DatasetProfile, dir: &Path) -> Result<Self, DatasetError> {
        let mut datasets = Vec::new();

        for descriptor in profile.descriptors() {
            let path = dir.join(descriptor.file_name);
            let dataset = if path.exists() {
                let dataset = Dataset::load(descriptor.name, descriptor.description, &path)?;
                if dataset.is_empty() {
                    tracing::warn!(
                        dataset = descriptor.name,
                        "Dataset file {} has no rows",
                        path.display()
                    );
                }
                tracing::info!(
                    dataset = descriptor.name,
                    rows = dataset.len(),
                    "Loaded dataset from {}",
                    path.display()
                );
                dataset
            } else {
                tracing::warn!(
                    dataset = descriptor.name,
                    "Dataset file {} not found, serving sample rows",
                    path.display()
                );
                Dataset::sample(descriptor.name, descriptor.description)
            };
            datasets.push(Arc::new(dataset));
        }

        Ok(Self { profile, datasets })
    }

    pub fn from_datasets(profile: DatasetProfile, datasets: Vec<Dataset>) -> Self {
        Self {
            profile,
            datasets: datasets.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn profile(&self) -> DatasetProfile {
        self.profile
    }

    pub fn get(&self, name: &str) -> Result<Arc<Dataset>, DatasetError> {
        self.datasets
            .iter()
            .find(|dataset| dataset.name() == name)
            .cloned()
            .ok_or_else(|| DatasetError::UnknownDataset(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.datasets.iter().map(|dataset| dataset.name()).collect()
    }

    pub fn summaries(&self) -> Vec<DatasetSummary> {
        self.datasets.iter().map(|dataset| dataset.summary()).collect()
    }
}
