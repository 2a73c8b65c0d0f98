//! Static `contacts` stream
//!
//! People records read from the `people` collection with a fixed nested
//! schema and incremental replication on `modified_date`.

use super::types::StreamDefinition;
use crate::error::Result;
use crate::schema::{JsonType, SchemaField, SchemaProperty, StreamSchema};
use url::Url;

/// Name of the static people stream
pub const CONTACTS_STREAM: &str = "contacts";

const CONTACTS_PATH: &str = "people";
const CONTACTS_REPLICATION_KEY: &str = "modified_date";

fn string(name: &str) -> SchemaField {
    SchemaField::new(name, SchemaProperty::string())
}

fn boolean(name: &str) -> SchemaField {
    SchemaField::new(name, SchemaProperty::new(JsonType::Boolean))
}

fn number(name: &str) -> SchemaField {
    SchemaField::new(name, SchemaProperty::new(JsonType::Number))
}

fn string_list(name: &str) -> SchemaField {
    SchemaField::new(name, SchemaProperty::array(SchemaProperty::string()))
}

fn object_list(name: &str, fields: Vec<SchemaField>) -> SchemaField {
    SchemaField::new(
        name,
        SchemaProperty::array(SchemaProperty::object(fields)),
    )
}

/// Schema of a person record
pub fn contacts_schema() -> StreamSchema {
    StreamSchema::from_fields(vec![
        string("given_name"),
        string("family_name"),
        string_list("identifiers"),
        object_list(
            "email_addresses",
            vec![string("address"), boolean("primary"), string("status")],
        ),
        object_list(
            "phone_numbers",
            vec![
                string("number"),
                boolean("primary"),
                string("status"),
                string("number_type"),
            ],
        ),
        object_list(
            "postal_addresses",
            vec![
                boolean("primary"),
                string_list("address_lines"),
                string("locality"),
                string("region"),
                string("postal_code"),
                string("country"),
                SchemaField::new(
                    "location",
                    SchemaProperty::object(vec![
                        number("latitude"),
                        number("longitude"),
                        string("accuracy"),
                    ]),
                ),
            ],
        ),
        string("_links"),
        string("custom_fields"),
        string("created_date"),
        string("modified_date"),
        string_list("languages_spoken"),
    ])
}

/// The `contacts` stream rooted at the given API URL
pub fn contacts_stream(api_url: &str) -> Result<StreamDefinition> {
    let mut base = Url::parse(api_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let url = base.join(CONTACTS_PATH)?;

    Ok(
        StreamDefinition::new(CONTACTS_STREAM, url.as_str(), contacts_schema())
            .with_collection(CONTACTS_PATH)
            .with_replication_key(CONTACTS_REPLICATION_KEY),
    )
}
