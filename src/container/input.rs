use std::collections::HashMap;

use bollard::container::Config;

use super::types::ClientInput;
use crate::config::{OWNER_LABEL, OWNER_LABEL_VALUE};
use crate::ports::Ports;

impl ClientInput {
    pub fn new(image: impl Into<String>) -> Self {
        let mut labels = HashMap::new();
        labels.insert(OWNER_LABEL.to_string(), OWNER_LABEL_VALUE.to_string());

        ClientInput {
            image: image.into(),
            labels,
            environment: Vec::new(),
            ports: Ports::new(),
            id: None,
            status: None,
            since: None,
            before: None,
            timeout: None,
        }
    }

    pub fn add_environment_var(&mut self, key: &str, value: &str) {
        self.environment.push(format!("{}={}", key, value));
    }

    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(key.into(), value.into());
    }

    pub fn remove_label(&mut self, key: &str) {
        self.labels.remove(key);
    }

    fn owned_labels(&self) -> HashMap<String, String> {
        let mut labels = self.labels.clone();
        labels.insert(OWNER_LABEL.to_string(), OWNER_LABEL_VALUE.to_string());
        labels
    }

    /// Container config without the port settings, which come from
    /// `Ports::resolve`.
    pub fn container_config(&self) -> Config<String> {
        Config {
            image: Some(self.image.clone()),
            labels: Some(self.owned_labels()),
            env: if self.environment.is_empty() {
                None
            } else {
                Some(self.environment.clone())
            },
            ..Default::default()
        }
    }

    /// Filters matching containers created from this input. Labels are sorted
    /// so the result is stable.
    pub fn filter_args(&self) -> HashMap<String, Vec<String>> {
        let mut filters: HashMap<String, Vec<String>> = HashMap::new();

        if let Some(id) = &self.id {
            filters.insert("id".to_string(), vec![id.clone()]);
        }
        if !self.image.is_empty() {
            filters.insert("ancestor".to_string(), vec![self.image.clone()]);
        }

        let mut labels: Vec<String> = self
            .owned_labels()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        labels.sort();
        filters.insert("label".to_string(), labels);

        for (name, value) in [
            ("status", &self.status),
            ("since", &self.since),
            ("before", &self.before),
        ] {
            if let Some(value) = value {
                filters.insert(name.to_string(), vec![value.clone()]);
            }
        }

        filters
    }
}
