use super::{ClientError, EventType, Node, NodeApi, ObjectRef};

/// Node API for runs without a cluster: nodes are synthesized from their
/// name and events only go to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRecorder;

impl NodeApi for LogRecorder {
    fn get_node(&self, name: &str) -> Result<Node, ClientError> {
        Ok(Node::named(name))
    }

    fn record_event(&self, object: &ObjectRef, event_type: EventType, reason: &str, message: &str) {
        match event_type {
            EventType::Normal => {
                log::info!("{} {}/{}: {}", reason, object.kind, object.name, message);
            }
            EventType::Warning => {
                log::warn!("{} {}/{}: {}", reason, object.kind, object.name, message);
            }
        }
    }
}
