use std::collections::BTreeMap;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::diet::model::score;

const BUILTIN: &str = include_str!("../../data/dish_ingredients.json");

/// Dish name → ingredients the generator should avoid when the dish is disliked.
#[derive(Debug, Clone, Deserialize)]
pub struct DishCatalog {
    pub version: u32,
    dishes: BTreeMap<String, Vec<String>>,
}

impl DishCatalog {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN).context("parse built-in dish table")
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads `path` when given, otherwise the table shipped with the binary.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let catalog = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("read dish table {}", p))?;
                Self::from_json(&raw).with_context(|| format!("parse dish table {}", p))?
            }
            None => Self::builtin()?,
        };
        info!(version = catalog.version, dishes = catalog.dishes.len(), "dish table loaded");
        Ok(catalog)
    }

    pub fn ingredients_of(&self, dish: &str) -> Option<&[String]> {
        self.dishes.get(dish).map(Vec::as_slice)
    }

    /// Ingredients of every dish scored "avoid". Unknown dishes are skipped.
    pub fn not_preferred_ingredients(&self, preferences: &BTreeMap<String, i64>) -> Vec<String> {
        let mut out = Vec::new();
        for (dish, _) in preferences.iter().filter(|(_, s)| **s == score::AVOID) {
            match self.ingredients_of(dish) {
                Some(items) => out.extend(items.iter().cloned()),
                None => debug!(dish = %dish, "disliked dish not in table; skipped"),
            }
        }
        out
    }
}
