//! Key names used in the key-value store. Absent keys read as empty/zero.

pub const ACTIVE_SESSION: &str = "activeSession";
pub const SESSION_ID: &str = "sessionId";
pub const SESSION_TASK: &str = "sessionTask";
pub const SESSION_START: &str = "sessionStart";
pub const SESSION_END: &str = "sessionEnd";
pub const VISITED_SITES: &str = "visitedSites";
pub const PRODUCTIVE_TIME: &str = "productiveTime";
pub const UNPRODUCTIVE_TIME: &str = "unproductiveTime";
pub const CLASSIFICATION_CACHE: &str = "classificationCache";
pub const CLASSIFICATION_FEEDBACK: &str = "classificationFeedback";

pub const SESSION_KEYS: [&str; 8] = [
    ACTIVE_SESSION,
    SESSION_ID,
    SESSION_TASK,
    SESSION_START,
    SESSION_END,
    VISITED_SITES,
    PRODUCTIVE_TIME,
    UNPRODUCTIVE_TIME,
];
