use std::path::PathBuf;

use codeseek_core::bootstrap::App;
use codeseek_core::notice::Notice;
use codeseek_index::ErrorKind;
use codeseek_llm::LlmProvider;
use dialoguer::{Confirm, Input, Select};

use crate::render;

const MENU: [&str; 3] = ["Ingest code", "Search", "Quit"];

/// Menu loop; returns when the user picks "Quit" or cancels the menu.
pub async fn run<P: LlmProvider>(app: &mut App<P>) -> anyhow::Result<()> {
    println!("codeseek - search your code in plain language\n");
    loop {
        let sel = Select::new()
            .with_prompt("What next?")
            .items(MENU)
            .default(0)
            .interact_opt()?;

        match sel {
            Some(0) => ingest_until_valid(app).await?,
            Some(1) => {
                let query: String = Input::new()
                    .with_prompt("Enter your search query")
                    .interact_text()?;
                crate::search(app, query.trim()).await;
            }
            _ => return Ok(()),
        }
        println!();
    }
}

/// Ask for a folder until one exists, then ingest it.
async fn ingest_until_valid<P: LlmProvider>(app: &mut App<P>) -> anyhow::Result<()> {
    loop {
        let raw: String = Input::new()
            .with_prompt("Enter the path to your code folder")
            .interact_text()?;
        let path = PathBuf::from(raw.trim());

        match crate::run_ingest(app, &path).await {
            Ok(report) => {
                for notice in Notice::for_ingest(&report) {
                    render::print_notice(&notice);
                }
                return Ok(());
            }
            Err(e) => {
                render::print_notice(&Notice::from_error(&e));
                if e.kind() != ErrorKind::PathNotFound {
                    return Ok(());
                }
            }
        }
    }
}

pub fn confirm_reset(count: usize) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!("Remove all {count} indexed document(s)?"))
        .default(false)
        .interact()?)
}
