//! Aggregation of the full BEA parameter space into one snapshot.
//!
//! This is an O(D * P) sequence of remote calls (D datasets, P parameters
//! per dataset) with no batching, which on the live service takes long
//! enough that progress and cancellation matter.

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::client::Client;
use crate::envelope::normalize_records;
use crate::error::{Error, Result};

/// Dataset names BEA still lists but has deprecated; skipped by default.
pub const DEPRECATED_DATASETS: &[&str] = &["RegionalData"];

/// Source of metadata, one method per remote call the aggregation makes.
///
/// [`Client`] is the real implementation; tests substitute an in-memory one.
pub trait MetadataSource {
    fn dataset_list(&self) -> Result<Value>;
    fn parameter_list(&self, dataset: &str) -> Result<Value>;
    fn parameter_values(&self, dataset: &str, parameter: &str) -> Result<Value>;
}

impl MetadataSource for Client {
    fn dataset_list(&self) -> Result<Value> {
        Client::dataset_list(self)
    }

    fn parameter_list(&self, dataset: &str) -> Result<Value> {
        Client::parameter_list(self, dataset)
    }

    fn parameter_values(&self, dataset: &str, parameter: &str) -> Result<Value> {
        Client::parameter_values(self, dataset, parameter)
    }
}

/// Cooperative cancellation flag, checked between remote calls.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One parameter's descriptor and its permitted values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMetadata {
    /// The parameter descriptor as returned by `GetParameterList`.
    pub details: Map<String, Value>,
    /// Permitted values as returned by `GetParameterValues`.
    pub values: Vec<Map<String, Value>>,
}

/// Complete snapshot of every dataset's parameter space, keyed by dataset
/// name, then parameter name. Built in one pass and handed to the caller;
/// nothing is cached between passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataSnapshot {
    pub datasets: BTreeMap<String, BTreeMap<String, ParameterMetadata>>,
}

impl MetadataSnapshot {
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }
}

/// Walks the whole dataset/parameter/value tree of a [`MetadataSource`].
#[derive(Debug, Clone)]
pub struct MetadataCollector {
    deprecated: Vec<String>,
    progress: bool,
    cancel: CancelToken,
}

impl Default for MetadataCollector {
    fn default() -> Self {
        Self {
            deprecated: DEPRECATED_DATASETS.iter().map(|s| s.to_string()).collect(),
            progress: true,
            cancel: CancelToken::new(),
        }
    }
}

impl MetadataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the deprecation filter. Names are compared exactly.
    pub fn with_deprecated<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deprecated = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// A handle another thread can use to stop the collection between
    /// remote calls.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Fetches the dataset list, then every surviving dataset's parameters
    /// and every parameter's permitted values.
    ///
    /// Deprecated datasets are dropped before any per-dataset calls are
    /// made. Parameter lists that arrive as a single object are normalized
    /// to a one-element list before iteration.
    pub fn collect<S: MetadataSource>(&self, source: &S) -> Result<MetadataSnapshot> {
        let datasets = normalize_records(&source.dataset_list()?)?;
        let datasets: Vec<_> = datasets
            .into_iter()
            .filter(|d| match d.get("DatasetName").and_then(Value::as_str) {
                Some(name) => !self.deprecated.iter().any(|dep| dep == name),
                None => true,
            })
            .collect();

        let pb = if self.progress {
            let pb = ProgressBar::new(datasets.len() as u64);
            pb.set_style(
                ProgressStyle::with_template("{spinner:.green} {pos}/{len} {wide_bar} {msg}")
                    .unwrap()
                    .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut snapshot = MetadataSnapshot::default();

        for descriptor in datasets {
            self.check_cancelled(&pb)?;

            let name = match descriptor.get("DatasetName").and_then(Value::as_str) {
                Some(name) => name.to_string(),
                None => {
                    return Err(Error::Structure {
                        key: "DatasetName".to_string(),
                        partial: Value::Object(descriptor),
                    });
                }
            };
            if let Some(pb) = &pb {
                pb.set_message(name.clone());
            }

            let parameters = normalize_records(&source.parameter_list(&name)?)?;
            let mut dataset_entry = BTreeMap::new();

            for details in parameters {
                self.check_cancelled(&pb)?;

                let param_name = match details.get("ParameterName").and_then(Value::as_str) {
                    Some(p) => p.to_string(),
                    None => {
                        return Err(Error::Structure {
                            key: "ParameterName".to_string(),
                            partial: Value::Object(details),
                        });
                    }
                };

                let values = normalize_records(&source.parameter_values(&name, &param_name)?)?;
                dataset_entry.insert(param_name, ParameterMetadata { details, values });
            }

            snapshot.datasets.insert(name, dataset_entry);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }

        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }
        Ok(snapshot)
    }

    fn check_cancelled(&self, pb: &Option<ProgressBar>) -> Result<()> {
        if self.cancel.is_cancelled() {
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}
