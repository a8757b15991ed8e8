// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use valvecode_app::{AppCommand, AppState};

/// One `--pick Field=Value` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub field: String,
    pub value: String,
}

impl Pick {
    pub fn parse(raw: &str) -> Result<Self> {
        let (field, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("--pick expects Field=Value, got {raw:?}"))?;
        let field = field.trim();
        let value = value.trim();
        if field.is_empty() || value.is_empty() {
            bail!("--pick expects Field=Value with both sides set, got {raw:?}");
        }
        Ok(Self {
            field: field.to_owned(),
            value: value.to_owned(),
        })
    }
}

/// Applies picks in schema order. Every value must be one of the field's
/// current options.
pub fn apply(state: &mut AppState, picks: &[Pick]) -> Result<()> {
    let mut ordered = Vec::with_capacity(picks.len());
    for pick in picks {
        let Some(index) = state.schema.position(&pick.field) else {
            let known: Vec<&str> = state
                .schema
                .fields()
                .iter()
                .map(|field| field.key.as_str())
                .collect();
            bail!(
                "unknown field {:?} in --pick; known fields: {}",
                pick.field,
                known.join(", ")
            );
        };
        if ordered.iter().any(|(seen, _)| *seen == index) {
            bail!("field {:?} picked more than once", pick.field);
        }
        ordered.push((index, pick));
    }
    ordered.sort_by_key(|(index, _)| *index);

    for (index, pick) in ordered {
        let options = state.field_options(index);
        if !options.contains(&pick.value) {
            bail!(
                "{:?} is not an option for {}; available: {}",
                pick.value,
                pick.field,
                if options.is_empty() {
                    "(none)".to_owned()
                } else {
                    options.join(", ")
                }
            );
        }
        state.dispatch(AppCommand::Select {
            field: index,
            value: pick.value.clone(),
        });
    }
    Ok(())
}
