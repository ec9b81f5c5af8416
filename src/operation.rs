//! The fixed set of remote methods the BEA API exposes.
//!
//! Each variant carries the identifiers its remote method requires and knows
//! its exact (case-sensitive) method name, its query parameters, and the
//! envelope node its results live under.

/// One remote BEA method call, with its required identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `GetDatasetList` — every dataset the service exposes.
    DatasetList,
    /// `GetParameterList` — the parameters of one dataset.
    ParameterList { dataset: String },
    /// `GetParameterValues` — permitted values of one parameter.
    ParameterValues { dataset: String, parameter: String },
    /// `GetParameterValuesFiltered` — permitted values of one parameter,
    /// restricted to a table.
    ParameterValuesFiltered {
        dataset: String,
        target_parameter: String,
        table_name: String,
    },
    /// `GetData` — statistics from one dataset, with caller-supplied
    /// dataset-specific selectors (table name, frequency, year, ...).
    Data {
        dataset: String,
        selectors: Vec<(String, String)>,
    },
}

impl Operation {
    /// The remote method name, exactly as BEA documents it.
    pub fn method(&self) -> &'static str {
        match self {
            Operation::DatasetList => "GetDatasetList",
            Operation::ParameterList { .. } => "GetParameterList",
            Operation::ParameterValues { .. } => "GetParameterValues",
            Operation::ParameterValuesFiltered { .. } => "GetParameterValuesFiltered",
            Operation::Data { .. } => "GetData",
        }
    }

    /// The envelope node under `Results` holding this operation's payload.
    pub fn result_node(&self) -> &'static str {
        match self {
            Operation::DatasetList => "Dataset",
            Operation::ParameterList { .. } => "Parameter",
            Operation::ParameterValues { .. } | Operation::ParameterValuesFiltered { .. } => {
                "ParamValue"
            }
            Operation::Data { .. } => "Data",
        }
    }

    /// Query parameters beyond `UserID`/`method`/`ResultFormat`, in the
    /// order BEA's documentation lists them.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self {
            Operation::DatasetList => Vec::new(),
            Operation::ParameterList { dataset } => {
                vec![("datasetname".into(), dataset.clone())]
            }
            Operation::ParameterValues { dataset, parameter } => vec![
                ("datasetname".into(), dataset.clone()),
                ("ParameterName".into(), parameter.clone()),
            ],
            Operation::ParameterValuesFiltered {
                dataset,
                target_parameter,
                table_name,
            } => vec![
                ("datasetname".into(), dataset.clone()),
                ("TargetParameter".into(), target_parameter.clone()),
                ("TableName".into(), table_name.clone()),
            ],
            Operation::Data { dataset, selectors } => {
                let mut pairs = vec![("datasetname".to_string(), dataset.clone())];
                pairs.extend(selectors.iter().cloned());
                pairs
            }
        }
    }
}
