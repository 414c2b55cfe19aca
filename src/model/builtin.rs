//! Built-in household inventory models, grouped by category.

use crate::model::{Catalog, FieldDescriptor, FieldType, ModelDescriptor};

const FOOD_UNITS: [&str; 7] = ["tsp", "tbsp", "ounce", "cup", "pint", "quart", "gallon"];

/// Fields shared by every stocked food item.
fn item(name: &str, counted: bool) -> ModelDescriptor {
    let m = ModelDescriptor::new(name)
        .field(FieldDescriptor::new("ingredient_id", FieldType::Integer).nullable().minimum(1.0).references("ingredient"))
        .field(FieldDescriptor::new("amount", FieldType::Integer).default_value(0))
        .field(FieldDescriptor::new("units", FieldType::Text).nullable().allowed(FOOD_UNITS))
        .field(FieldDescriptor::new("packaged_on", FieldType::DateTime).nullable())
        .field(FieldDescriptor::new("lifetime", FieldType::Duration).nullable())
        .field(FieldDescriptor::new("expires", FieldType::DateTime).nullable());
    if counted {
        m.field(FieldDescriptor::new("count", FieldType::Integer).minimum(0.0))
    } else {
        m
    }
}

pub fn food() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("Ingredient").field(FieldDescriptor::new("name", FieldType::Text).index()),
        item("FreshItem", false),
        item("CannedGood", true),
        item("JarredGood", true),
        item("BulkGood", true),
        item("BoxedGood", true),
    ]
}

pub fn devices() -> Vec<ModelDescriptor> {
    vec![ModelDescriptor::new("RemoteDevice")
        .field(FieldDescriptor::new("name", FieldType::Text))
        .field(FieldDescriptor::new("location", FieldType::Text))
        .field(FieldDescriptor::new("ipaddress", FieldType::IpAddress))
        .field(FieldDescriptor::new("latitude", FieldType::Float).nullable())
        .field(FieldDescriptor::new("longitude", FieldType::Float).nullable())
        .field(FieldDescriptor::new("input_type", FieldType::Text).allowed(["digital", "analog"]))]
}

pub fn medicine() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("Medicine").field(FieldDescriptor::new("name", FieldType::Text)),
        ModelDescriptor::new("Container")
            .field(FieldDescriptor::new("medicine_id", FieldType::Integer).references("medicine"))
            .field(FieldDescriptor::new("size", FieldType::Integer).nullable().minimum(1.0))
            .field(FieldDescriptor::new("units", FieldType::Text).nullable().allowed(["mg"]))
            .field(FieldDescriptor::new("count", FieldType::Integer).minimum(0.0))
            .field(FieldDescriptor::new("max", FieldType::Integer).default_value(1).minimum(1.0)),
    ]
}

pub fn sensors() -> Vec<ModelDescriptor> {
    vec![ModelDescriptor::new("Sensor")
        .field(FieldDescriptor::new("name", FieldType::Text))
        .field(FieldDescriptor::new("location", FieldType::Text))
        .field(FieldDescriptor::new("ipaddress", FieldType::IpAddress))
        .field(FieldDescriptor::new("latitude", FieldType::Float))
        .field(FieldDescriptor::new("longitude", FieldType::Float))]
}

pub fn music() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new("Artist").field(FieldDescriptor::new("name", FieldType::Text)),
        ModelDescriptor::new("Album")
            .field(FieldDescriptor::new("artist_id", FieldType::Integer).nullable().references("artist"))
            .field(FieldDescriptor::new("name", FieldType::Text))
            .field(FieldDescriptor::new("released", FieldType::DateTime)),
        ModelDescriptor::new("Track")
            .field(FieldDescriptor::new("album_id", FieldType::Integer).nullable().references("album"))
            .field(FieldDescriptor::new("title", FieldType::Text))
            .field(FieldDescriptor::new("path", FieldType::Text))
            .field(FieldDescriptor::new("filetype", FieldType::Text).allowed(["mp3", "wav"]))
            .field(FieldDescriptor::new("length", FieldType::Integer)),
    ]
}

pub fn video() -> Vec<ModelDescriptor> {
    vec![ModelDescriptor::new("Video")
        .field(FieldDescriptor::new("name", FieldType::Text))
        .field(FieldDescriptor::new("path", FieldType::Text).unique())
        .field(FieldDescriptor::new("filetype", FieldType::Text).allowed(["avi", "mkv"]))
        .field(FieldDescriptor::new("length", FieldType::Integer))
        .field(FieldDescriptor::new("released", FieldType::DateTime))]
}

/// Every built-in category, in mount order.
pub fn builtin() -> Catalog {
    Catalog::new()
        .category("food", food())
        .category("devices", devices())
        .category("medicine", medicine())
        .category("sensors", sensors())
        .category("music", music())
        .category("video", video())
}
