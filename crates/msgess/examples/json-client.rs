//! JSON exchange client: sends a few objects with class 789 and prints each
//! echoed reply. The last object asks the peer to close the connection.
//!
//! Run with:
//!   cargo run --example json-client -- 127.0.0.1:5568

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use msgess::frame::{Connection, JsonObject};
use msgess::transport::{connect, Endpoint};
use serde_json::json;

const MESSAGE_COUNT: u64 = 5;
const MESSAGE_CLASS: u32 = 789;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let endpoint: Endpoint = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:5568".to_string())
        .parse()?;
    let mut conn = Connection::new(connect(&endpoint)?);

    for i in 0..=MESSAGE_COUNT {
        let close = i == MESSAGE_COUNT;
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        let mut object = JsonObject::new();
        object.insert("timestamp".into(), json!(timestamp));
        object.insert("i".into(), json!(i));
        object.insert("close_connection".into(), json!(close));
        conn.send_json_object(object, MESSAGE_CLASS)?;

        let (reply, class) = conn.receive_json_object()?;
        println!("Object received (class {class}): {}", serde_json::Value::Object(reply));

        if !close {
            thread::sleep(Duration::from_millis(200));
        }
    }

    Ok(())
}
