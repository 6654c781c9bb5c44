//! Webhook subscription constraints.
//!
//! A webhook document declares subscriptions two ways: a top-level
//! `topics` list delivered to a top-level destination, and a
//! `subscriptions` list of records that may override that destination.
//! A destination is exactly one of an endpoint URL, a pubsub
//! project/topic pair, or an ARN.
//!
//! The subscription key of a record is its topic, the destination in
//! effect and its path. Keys must be unique across the top-level topics and
//! every record.

use std::collections::HashSet;

use serde_json::Value;

use super::{Halt, Reporter};
use crate::config::ConstraintMode;
use crate::error::{ConstraintError, ConstraintErrorKind, ConstraintScope};
use crate::path::FieldPath;
use crate::walker::str_at;

const ENDPOINT_FIELD: &str = "subscription_endpoint_url";
const PUBSUB_PROJECT_FIELD: &str = "pubsub_project";
const PUBSUB_TOPIC_FIELD: &str = "pubsub_topic";
const ARN_FIELD: &str = "arn";

/// The destination forms a subscription can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    Endpoint,
    PubSub,
    Arn,
}

/// Identity of a destination in a subscription key.
///
/// Tagged by form: an ARN and a pubsub pair never compare equal, whatever
/// their text. An endpoint carries the record path appended to its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum DestinationKey {
    Unset,
    Endpoint(String),
    PubSub(Option<String>, Option<String>),
    Arn(String),
}

/// Destination fields declared at one level of a webhook document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destination {
    pub subscription_endpoint_url: Option<String>,
    pub pubsub_project: Option<String>,
    pub pubsub_topic: Option<String>,
    pub arn: Option<String>,
}

impl Destination {
    /// Reads the destination fields of a document or record.
    pub fn from_value(value: &Value) -> Self {
        Self {
            subscription_endpoint_url: str_at(value, ENDPOINT_FIELD).map(str::to_string),
            pubsub_project: str_at(value, PUBSUB_PROJECT_FIELD).map(str::to_string),
            pubsub_topic: str_at(value, PUBSUB_TOPIC_FIELD).map(str::to_string),
            arn: str_at(value, ARN_FIELD).map(str::to_string),
        }
    }

    /// Returns true if any destination field is set.
    pub fn is_set(&self) -> bool {
        self.forms_set() > 0
    }

    pub fn has_endpoint(&self) -> bool {
        self.subscription_endpoint_url.is_some()
    }

    fn has_pubsub(&self) -> bool {
        self.pubsub_project.is_some() || self.pubsub_topic.is_some()
    }

    /// Returns true if exactly one half of the pubsub pair is set.
    pub fn pair_incomplete(&self) -> bool {
        self.pubsub_project.is_some() != self.pubsub_topic.is_some()
    }

    /// Number of destination forms set. A half pubsub pair counts as one.
    pub fn forms_set(&self) -> usize {
        [self.has_endpoint(), self.has_pubsub(), self.arn.is_some()]
            .iter()
            .filter(|set| **set)
            .count()
    }

    /// The destination form in effect, if any.
    pub fn kind(&self) -> Option<DestinationKind> {
        if self.has_endpoint() {
            Some(DestinationKind::Endpoint)
        } else if self.has_pubsub() {
            Some(DestinationKind::PubSub)
        } else if self.arn.is_some() {
            Some(DestinationKind::Arn)
        } else {
            None
        }
    }

    /// Key of the form in effect. `path` only applies to endpoints.
    pub(crate) fn key(&self, path: Option<&str>) -> DestinationKey {
        match self.kind() {
            None => DestinationKey::Unset,
            Some(DestinationKind::Endpoint) => DestinationKey::Endpoint(format!(
                "{}{}",
                self.subscription_endpoint_url.as_deref().unwrap_or_default(),
                path.unwrap_or_default()
            )),
            Some(DestinationKind::PubSub) => {
                DestinationKey::PubSub(self.pubsub_project.clone(), self.pubsub_topic.clone())
            }
            Some(DestinationKind::Arn) => {
                DestinationKey::Arn(self.arn.clone().unwrap_or_default())
            }
        }
    }

    /// The remote delivery URI: the endpoint URL, `pubsub://project:topic`, or the ARN.
    pub fn uri(&self) -> Option<String> {
        match self.kind()? {
            DestinationKind::Endpoint => self.subscription_endpoint_url.clone(),
            DestinationKind::PubSub => match (&self.pubsub_project, &self.pubsub_topic) {
                (Some(project), Some(topic)) => Some(format!("pubsub://{}:{}", project, topic)),
                _ => None,
            },
            DestinationKind::Arn => self.arn.clone(),
        }
    }

    fn first_field_name(&self) -> &'static str {
        match self.kind() {
            Some(DestinationKind::Endpoint) | None => ENDPOINT_FIELD,
            Some(DestinationKind::PubSub) if self.pubsub_project.is_some() => PUBSUB_PROJECT_FIELD,
            Some(DestinationKind::PubSub) => PUBSUB_TOPIC_FIELD,
            Some(DestinationKind::Arn) => ARN_FIELD,
        }
    }

    fn missing_pubsub_field(&self) -> &'static str {
        if self.pubsub_project.is_some() {
            PUBSUB_TOPIC_FIELD
        } else {
            PUBSUB_PROJECT_FIELD
        }
    }
}

/// One subscription with its destination resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSubscription {
    pub topic: String,
    pub destination: Destination,
    pub path: Option<String>,
    pub sub_topic: Option<String>,
    pub format: Option<String>,
    pub include_fields: Vec<String>,
    pub metafield_namespaces: Vec<String>,
}

impl EffectiveSubscription {
    /// Delivery URI with the relative path appended for endpoint destinations.
    pub fn uri(&self) -> Option<String> {
        let uri = self.destination.uri()?;
        match (&self.path, self.destination.kind()) {
            (Some(path), Some(DestinationKind::Endpoint)) => Some(format!("{}{}", uri, path)),
            _ => Some(uri),
        }
    }
}

/// Validates the subscription rules of a webhook document.
///
/// Checks run in order: top-level pair completeness, top-level
/// exclusivity, unused destination, topics without destination, duplicate
/// top-level topics, then each record (exclusivity, pair completeness,
/// missing destination, path compatibility, key uniqueness).
///
/// In [`ConstraintMode::FailFast`] only the first violation is returned.
/// In [`ConstraintMode::Collect`] every violation is returned; records with
/// an invalid destination are left out of key uniqueness.
///
/// # Example
/// ```
/// use modkit_spec::config::ConstraintMode;
/// use modkit_spec::constraint::validate_webhook_subscriptions;
/// use modkit_spec::error::ConstraintErrorKind;
/// use serde_json::json;
///
/// let doc = json!({"topics": ["orders/create"], "subscription_endpoint_url": "https://a.com"});
/// assert!(validate_webhook_subscriptions(&doc, ConstraintMode::FailFast).is_ok());
///
/// let doc = json!({
///     "topics": ["orders/create", "orders/create"],
///     "subscription_endpoint_url": "https://a.com"
/// });
/// let errors = validate_webhook_subscriptions(&doc, ConstraintMode::FailFast).unwrap_err();
/// assert_eq!(errors[0].kind, ConstraintErrorKind::DuplicateSubscription);
/// ```
pub fn validate_webhook_subscriptions(
    document: &Value,
    mode: ConstraintMode,
) -> Result<(), Vec<ConstraintError>> {
    if !document.is_object() {
        return Ok(());
    }
    let mut reporter = Reporter::new(mode);
    // Halt only ends the pass early; the reporter already holds the error.
    let _ = check_document(document, &mut reporter);
    reporter.finish()
}

/// Expands a webhook document into one entry per delivered subscription.
///
/// Top-level topics come first, then records in declaration order. The
/// document is expected to have passed [`validate_webhook_subscriptions`].
pub fn effective_subscriptions(document: &Value) -> Vec<EffectiveSubscription> {
    if !document.is_object() {
        return Vec::new();
    }
    let top = Destination::from_value(document);
    let mut out = Vec::new();

    for (_, topic) in string_list(document.get("topics")) {
        out.push(EffectiveSubscription {
            topic: topic.to_string(),
            destination: top.clone(),
            path: None,
            sub_topic: None,
            format: None,
            include_fields: Vec::new(),
            metafield_namespaces: Vec::new(),
        });
    }

    for record in records(document).iter().filter(|record| record.is_object()) {
        let Some(topic) = str_at(record, "topic") else {
            continue;
        };
        let own = Destination::from_value(record);
        out.push(EffectiveSubscription {
            topic: topic.to_string(),
            destination: if own.is_set() { own } else { top.clone() },
            path: str_at(record, "path").map(str::to_string),
            sub_topic: str_at(record, "sub_topic").map(str::to_string),
            format: str_at(record, "format").map(str::to_string),
            include_fields: owned_list(record.get("include_fields")),
            metafield_namespaces: owned_list(record.get("metafield_namespaces")),
        });
    }

    out
}

fn check_document(document: &Value, reporter: &mut Reporter) -> Result<(), Halt> {
    let top = Destination::from_value(document);
    let topics = string_list(document.get("topics"));
    let records = records(document);

    if top.pair_incomplete() {
        reporter.report(ConstraintError::new(
            ConstraintErrorKind::IncompletePubSubPair,
            ConstraintScope::TopLevel,
            "pubsub_project and pubsub_topic must be set together",
            FieldPath::from_segments([top.missing_pubsub_field()]),
        ))?;
    }

    if top.forms_set() > 1 {
        reporter.report(ConstraintError::new(
            ConstraintErrorKind::MultipleDestinations,
            ConstraintScope::TopLevel,
            "only one of subscription_endpoint_url, pubsub_project/pubsub_topic or arn may be set",
            FieldPath::root(),
        ))?;
    }

    if top.is_set() && topics.is_empty() && records.is_empty() {
        reporter.report(ConstraintError::new(
            ConstraintErrorKind::UnusedDestination,
            ConstraintScope::TopLevel,
            "a destination is set but no topics or subscriptions use it",
            FieldPath::from_segments([top.first_field_name()]),
        ))?;
    }

    if !topics.is_empty() && !top.is_set() {
        reporter.report(ConstraintError::new(
            ConstraintErrorKind::TopicsMissingDestination,
            ConstraintScope::TopLevel,
            "topics require a subscription_endpoint_url, pubsub_project/pubsub_topic or arn",
            FieldPath::from_segments(["topics"]),
        ))?;
    }

    let mut seen: HashSet<(String, DestinationKey)> = HashSet::new();
    let top_destination = top.key(None);
    for (index, topic) in &topics {
        if !seen.insert((topic.to_string(), top_destination.clone())) {
            reporter.report(ConstraintError::new(
                ConstraintErrorKind::DuplicateSubscription,
                ConstraintScope::TopLevel,
                format!(
                    "duplicate subscription for topic '{}' with the same destination",
                    topic
                ),
                FieldPath::from_segments(["topics"]).child(*index),
            ))?;
        }
    }

    for (index, record) in records.iter().enumerate() {
        if record.is_object() {
            check_record(index, record, &top, &mut seen, reporter)?;
        }
    }

    Ok(())
}

fn check_record(
    index: usize,
    record: &Value,
    top: &Destination,
    seen: &mut HashSet<(String, DestinationKey)>,
    reporter: &mut Reporter,
) -> Result<(), Halt> {
    let base = FieldPath::from_segments(["subscriptions"]).child(index);
    let own = Destination::from_value(record);
    let path = str_at(record, "path");
    let mut usable = true;

    // Exclusivity runs before pair completeness so that e.g. project + arn
    // reports the conflicting forms rather than the missing half.
    if own.forms_set() > 1 {
        usable = false;
        reporter.report(ConstraintError::new(
            ConstraintErrorKind::MultipleDestinations,
            ConstraintScope::Record,
            "only one of subscription_endpoint_url, pubsub_project/pubsub_topic or arn may be set",
            base.clone(),
        ))?;
    }

    if own.pair_incomplete() {
        usable = false;
        reporter.report(ConstraintError::new(
            ConstraintErrorKind::IncompletePubSubPair,
            ConstraintScope::Record,
            "pubsub_project and pubsub_topic must be set together",
            base.child(own.missing_pubsub_field()),
        ))?;
    }

    if !own.is_set() && !top.is_set() {
        usable = false;
        reporter.report(ConstraintError::new(
            ConstraintErrorKind::MissingDestination,
            ConstraintScope::Record,
            "subscription has no destination and no top-level destination is set",
            base.clone(),
        ))?;
    }

    let effective = if own.is_set() { &own } else { top };

    if path.is_some() {
        let endpoint_in_scope = own.has_endpoint() || top.has_endpoint();
        if !endpoint_in_scope {
            usable = false;
            reporter.report(ConstraintError::new(
                ConstraintErrorKind::PathMissingEndpoint,
                ConstraintScope::Record,
                "path requires a subscription_endpoint_url",
                base.child("path"),
            ))?;
        } else if effective.kind() != Some(DestinationKind::Endpoint) {
            usable = false;
            reporter.report(ConstraintError::new(
                ConstraintErrorKind::PathWithIncompatibleDestination,
                ConstraintScope::Record,
                "path can only be used with a subscription_endpoint_url destination",
                base.child("path"),
            ))?;
        }
    }

    if !usable {
        return Ok(());
    }
    let Some(topic) = str_at(record, "topic") else {
        return Ok(());
    };

    if !seen.insert((topic.to_string(), effective.key(path))) {
        reporter.report(ConstraintError::new(
            ConstraintErrorKind::DuplicateSubscription,
            ConstraintScope::Record,
            format!(
                "duplicate subscription for topic '{}' with the same destination",
                topic
            ),
            base.child("topic"),
        ))?;
    }

    Ok(())
}

fn records(document: &Value) -> &[Value] {
    document
        .get("subscriptions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn string_list(value: Option<&Value>) -> Vec<(usize, &str)> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| item.as_str().map(|s| (i, s)))
                .collect()
        })
        .unwrap_or_default()
}

fn owned_list(value: Option<&Value>) -> Vec<String> {
    string_list(value)
        .into_iter()
        .map(|(_, s)| s.to_string())
        .collect()
}
