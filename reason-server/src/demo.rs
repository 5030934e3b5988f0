//! Demo resource served by the `reason-server` binary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// A catalogue item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Widget {
    pub id: u64,
    pub name: String,
    pub price: f64,
    #[serde(rename = "in_stock")]
    pub available: bool,
}

impl Record for Widget {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Seed data for the demo `widgets` resource.
#[must_use]
pub fn example_widgets() -> Vec<Widget> {
    vec![
        Widget { id: 1, name: "Sprocket".to_owned(), price: 4.5, available: true },
        Widget { id: 2, name: "Flange".to_owned(), price: 12.0, available: false },
        Widget { id: 3, name: "Grommet".to_owned(), price: 0.25, available: true },
    ]
}
