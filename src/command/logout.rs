// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use course_planner::error::Result;

use super::Planner;

/// Forget the stored identity.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, planner: &Planner) -> Result<()> {
        planner.session.logout().await?;
        planner.selection.on_token_change(None).await;
        println!("Logged out.");
        Ok(())
    }
}
