// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use course_planner::error::Result;

use super::Planner;

/// Show whether the stored identity belongs to an authenticated user.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Ask the catalog service even if the user is already known.
    #[arg(short, long)]
    refresh: bool,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, planner: &Planner) -> Result<()> {
        let _ = planner.session.check_authentication(self.refresh).await?;

        println!("Session: {}", planner.session.state());
        if let Some(user) = planner.session.user() {
            println!("User: {}", user.name);
            if user.has_registered_courses {
                println!("Courses are already registered for this term.");
            }
        }
        println!(
            "Token storage: {}",
            if planner.session.persists_token().await {
                "persistent"
            } else {
                "in memory"
            }
        );
        Ok(())
    }
}
