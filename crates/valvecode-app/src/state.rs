// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    DerivedCode, FieldSchema, LoadError, Progress, Selection, Table, derive_code, options,
    progress,
};

pub const DEFAULT_CATEGORY: &str = "Gate_Valve";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loading,
    Ready { rows: usize },
    Failed(String),
}

/// Everything the configurator knows. Mutated only through [`AppState::dispatch`],
/// which recomputes the derived code and progress before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub category: String,
    pub schema: FieldSchema,
    pub expected_length: usize,
    pub load: LoadStatus,
    pub status_line: Option<String>,
    table: Table,
    selection: Selection,
    filters: Vec<String>,
    code: DerivedCode,
    progress: Progress,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORY,
            FieldSchema::valve_default(),
            crate::DEFAULT_EXPECTED_CODE_LENGTH,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    TableLoaded(Table),
    LoadFailed(LoadError),
    Select { field: usize, value: String },
    ClearFrom(usize),
    ResetAll,
    SetFilter { field: usize, text: String },
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    TableReplaced { rows: usize },
    LoadFailed(String),
    SelectionChanged { field: usize, value: String },
    SelectionCleared { keys: Vec<String> },
    FilterChanged { field: usize, text: String },
    CodeChanged(DerivedCode),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(category: impl Into<String>, schema: FieldSchema, expected_length: usize) -> Self {
        let filters = vec![String::new(); schema.len()];
        let selection = Selection::new();
        let table = Table::empty();
        let code = derive_code(&table, &schema, &selection, expected_length);
        let progress = progress(&schema, &selection);
        Self {
            category: category.into(),
            schema,
            expected_length,
            load: LoadStatus::Loading,
            status_line: None,
            table,
            selection,
            filters,
            code,
            progress,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn code(&self) -> &DerivedCode {
        &self.code
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn filter(&self, field: usize) -> &str {
        self.filters.get(field).map_or("", String::as_str)
    }

    pub fn selected_value(&self, field: usize) -> Option<&str> {
        let descriptor = self.schema.get(field)?;
        self.selection.get(&descriptor.key)
    }

    /// Option list for the field at `field`, narrowed by its filter text.
    pub fn field_options(&self, field: usize) -> Vec<String> {
        match self.schema.get(field) {
            Some(descriptor) => options(&self.table, &descriptor.key, self.filter(field)),
            None => Vec::new(),
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        let mut events = match command {
            AppCommand::TableLoaded(table) => {
                let rows = table.len();
                self.table = table;
                self.load = LoadStatus::Ready { rows };
                let mut events = vec![AppEvent::TableReplaced { rows }];
                events.extend(self.clear_from(0));
                events.extend(self.reset_filters());
                events
            }
            AppCommand::LoadFailed(error) => {
                let message = error.user_message();
                self.table = Table::empty();
                self.load = LoadStatus::Failed(message.clone());
                vec![AppEvent::LoadFailed(message)]
            }
            AppCommand::Select { field, value } => {
                let Some(descriptor) = self.schema.get(field) else {
                    return Vec::new();
                };
                self.selection.select(descriptor.key.clone(), value.clone());
                let mut events = vec![AppEvent::SelectionChanged { field, value }];
                events.extend(self.set_filter(field, String::new()));
                events
            }
            AppCommand::ClearFrom(start) => self.clear_from(start).into_iter().collect(),
            AppCommand::ResetAll => self.clear_from(0).into_iter().collect(),
            AppCommand::SetFilter { field, text } => {
                self.set_filter(field, text).into_iter().collect()
            }
            AppCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![AppEvent::StatusUpdated(message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        };

        events.extend(self.rederive());
        events
    }

    fn clear_from(&mut self, start: usize) -> Option<AppEvent> {
        let keys = self.selection.clear_from(&self.schema, start);
        if keys.is_empty() {
            None
        } else {
            Some(AppEvent::SelectionCleared { keys })
        }
    }

    fn set_filter(&mut self, field: usize, text: String) -> Option<AppEvent> {
        let slot = self.filters.get_mut(field)?;
        if *slot == text {
            return None;
        }
        slot.clone_from(&text);
        Some(AppEvent::FilterChanged { field, text })
    }

    fn reset_filters(&mut self) -> Vec<AppEvent> {
        (0..self.filters.len())
            .filter_map(|field| self.set_filter(field, String::new()))
            .collect()
    }

    fn rederive(&mut self) -> Option<AppEvent> {
        self.progress = progress(&self.schema, &self.selection);
        let code = derive_code(
            &self.table,
            &self.schema,
            &self.selection,
            self.expected_length,
        );
        if code == self.code {
            return None;
        }
        self.code = code.clone();
        Some(AppEvent::CodeChanged(code))
    }
}
