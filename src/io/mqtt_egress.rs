//! MQTT publisher for sensor entity snapshots
//!
//! Topics (all retained, under the configured prefix):
//! - {prefix}/{object_id}/state - entity state (QoS 1)
//! - {prefix}/{object_id}/attributes - attribute JSON (QoS 1)
//! - {prefix}/availability - "online" after a good poll, "offline" after a failed one
//!
//! A snapshot replaces the previous one: entities it no longer carries get an
//! empty retained payload on both topics, which clears them on the broker.

use crate::infra::config::Config;
use crate::services::entities::SensorEntity;
use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Packet, QoS};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const ONLINE: &str = "online";
pub const OFFLINE: &str = "offline";

/// Messages the poller hands to the publisher
#[derive(Debug)]
pub enum EgressMessage {
    /// Full replacement snapshot from a successful query
    Snapshot(Vec<SensorEntity>),
    /// The last query failed; entities go unavailable
    Unavailable,
}

/// Topic layout for one prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Topics {
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.trim_end_matches('/').to_string() }
    }

    pub fn state(&self, object_id: &str) -> String {
        format!("{}/{}/state", self.prefix, object_id)
    }

    pub fn attributes(&self, object_id: &str) -> String {
        format!("{}/{}/attributes", self.prefix, object_id)
    }

    pub fn availability(&self) -> String {
        format!("{}/availability", self.prefix)
    }
}

/// Text published on an entity's state topic
pub fn state_payload(state: &Value) -> String {
    match state {
        Value::Null => "unknown".to_string(),
        Value::Bool(true) => "on".to_string(),
        Value::Bool(false) => "off".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Ids published before that `current` no longer carries, sorted
pub fn stale_object_ids(previous: &FxHashSet<String>, current: &[SensorEntity]) -> Vec<String> {
    let current: FxHashSet<&str> = current.iter().map(|e| e.object_id.as_str()).collect();
    let mut stale: Vec<String> =
        previous.iter().filter(|id| !current.contains(id.as_str())).cloned().collect();
    stale.sort();
    stale
}

/// MQTT publisher for entity snapshots
pub struct EntityPublisher {
    client: AsyncClient,
    topics: Topics,
    /// Object ids of the last published snapshot
    published: FxHashSet<String>,
}

impl EntityPublisher {
    /// Create a new publisher
    ///
    /// Connects to the broker at the configured MQTT host/port. The broker
    /// marks the bridge offline if the connection drops.
    pub fn new(config: &Config) -> Self {
        let topics = Topics::new(config.mqtt_topic_prefix());
        let mut mqttoptions =
            MqttOptions::new(config.mqtt_client_id(), config.mqtt_host(), config.mqtt_port());
        mqttoptions.set_keep_alive(Duration::from_secs(30));
        mqttoptions.set_clean_session(true);
        mqttoptions.set_last_will(LastWill::new(
            topics.availability(),
            OFFLINE,
            QoS::AtLeastOnce,
            true,
        ));

        if let (Some(username), Some(password)) = (config.mqtt_username(), config.mqtt_password()) {
            mqttoptions.set_credentials(username, password);
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, 100);

        tokio::spawn(async move {
            let mut eventloop = eventloop;
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("mqtt_connected");
                    }
                    Ok(Event::Incoming(Packet::PubAck(_))) => {
                        debug!("mqtt_puback");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "mqtt_connection_error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self { client, topics, published: FxHashSet::default() }
    }

    pub async fn publish(&mut self, msg: EgressMessage) {
        match msg {
            EgressMessage::Snapshot(entities) => {
                let stale = stale_object_ids(&self.published, &entities);
                for object_id in &stale {
                    self.clear_entity(object_id).await;
                }
                for entity in &entities {
                    self.publish_entity(entity).await;
                }
                self.published = entities.iter().map(|e| e.object_id.clone()).collect();
                self.publish_retained(&self.topics.availability(), ONLINE.to_string()).await;
                info!(entities = %entities.len(), cleared = %stale.len(), "snapshot_published");
            }
            EgressMessage::Unavailable => {
                self.publish_retained(&self.topics.availability(), OFFLINE.to_string()).await;
                info!("unavailable_published");
            }
        }
    }

    async fn publish_entity(&self, entity: &SensorEntity) {
        self.publish_retained(&self.topics.state(&entity.object_id), state_payload(&entity.state))
            .await;

        if let Some(attributes) = &entity.attributes {
            match serde_json::to_string(attributes) {
                Ok(json) => {
                    self.publish_retained(&self.topics.attributes(&entity.object_id), json).await
                }
                Err(e) => error!(object_id = %entity.object_id, error = %e, "attributes_encode_failed"),
            }
        }
    }

    async fn clear_entity(&self, object_id: &str) {
        self.publish_retained(&self.topics.state(object_id), String::new()).await;
        self.publish_retained(&self.topics.attributes(object_id), String::new()).await;
        debug!(object_id = %object_id, "entity_cleared");
    }

    async fn publish_retained(&self, topic: &str, payload: String) {
        if let Err(e) = self.client.publish(topic, QoS::AtLeastOnce, true, payload.into_bytes()).await {
            error!(topic = %topic, error = %e, "mqtt_publish_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(object_id: &str) -> SensorEntity {
        SensorEntity {
            object_id: object_id.to_string(),
            name: object_id.to_string(),
            state: json!("2024-03-05"),
            attributes: None,
        }
    }

    fn ids(ids: &[&str]) -> FxHashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_topics() {
        let topics = Topics::new("home/himama/");
        assert_eq!(topics.state("himama_latest_meals"), "home/himama/himama_latest_meals/state");
        assert_eq!(
            topics.attributes("himama_latest_meals"),
            "home/himama/himama_latest_meals/attributes"
        );
        assert_eq!(topics.availability(), "home/himama/availability");
    }

    #[test]
    fn test_state_payload() {
        assert_eq!(state_payload(&json!("2024-03-05")), "2024-03-05");
        assert_eq!(state_payload(&json!(true)), "on");
        assert_eq!(state_payload(&json!(false)), "off");
        assert_eq!(state_payload(&Value::Null), "unknown");
    }

    #[test]
    fn test_stale_ids_dropped_from_snapshot() {
        let previous = ids(&["himama_latest_notes", "himama_latest_meals", "himama_at_daycare"]);
        let current = vec![entity("himama_latest_meals"), entity("himama_at_daycare")];
        assert_eq!(stale_object_ids(&previous, &current), vec!["himama_latest_notes"]);
    }

    #[test]
    fn test_stale_ids_sorted_and_empty_when_nothing_dropped() {
        let previous = ids(&["himama_latest_naps", "himama_latest_fluids", "himama_at_daycare"]);
        let current = vec![entity("himama_at_daycare")];
        assert_eq!(
            stale_object_ids(&previous, &current),
            vec!["himama_latest_fluids", "himama_latest_naps"]
        );

        let grown: Vec<SensorEntity> = ["himama_latest_naps", "himama_latest_fluids", "himama_at_daycare", "himama_latest_mood"]
            .into_iter()
            .map(entity)
            .collect();
        assert!(stale_object_ids(&previous, &grown).is_empty());
        assert!(stale_object_ids(&FxHashSet::default(), &grown).is_empty());
    }
}
