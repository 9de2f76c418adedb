use uuid::Uuid;

/// New record keys are UUIDv7 so insertion order and key order agree.
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}
