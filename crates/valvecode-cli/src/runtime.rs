// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::{self, Write};
use std::sync::mpsc::Sender;
use std::thread;
use valvecode_app::{LoadError, Table};
use valvecode_sheet::SheetClient;
use valvecode_tui::InternalEvent;

pub struct SheetRuntime {
    client: SheetClient,
}

impl SheetRuntime {
    pub fn new(client: SheetClient) -> Self {
        Self { client }
    }
}

impl valvecode_tui::AppRuntime for SheetRuntime {
    fn load_table(&mut self, category: &str) -> Result<Table, LoadError> {
        self.client.load_table(category)
    }

    fn spawn_table_load(&mut self, category: &str, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        let category = category.to_owned();
        thread::Builder::new()
            .name("sheet-load".to_owned())
            .spawn(move || {
                let result = client.load_table(&category);
                if tx.send(InternalEvent::TableLoaded(result)).is_err() {
                    tracing::debug!(%category, "ui exited before load finished");
                }
            })
            .context("spawn sheet load thread")?;
        Ok(())
    }

    fn copy_code(&mut self, code: &str) -> Result<()> {
        let mut stdout = io::stdout();
        write_osc52(&mut stdout, code)
    }
}

/// Clipboard write via the terminal's OSC 52 escape.
fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

fn write_osc52<W: Write>(out: &mut W, text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(anyhow!("nothing to copy"));
    }
    out.write_all(osc52_sequence(text).as_bytes())
        .context("write clipboard escape")?;
    out.flush().context("flush clipboard escape")
}
