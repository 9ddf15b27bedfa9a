// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use course_planner::{
    error::{Error, Result},
    model::Token,
    Service, Verification,
};
use log::error;

use super::Planner;

/// Log in with a user ID issued by the catalog service.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The user ID to log in with.
    #[arg(env = "PLANNER_UID", hide_env_values = true)]
    uid: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, planner: &Planner) -> Result<()> {
        let token = Token::new(self.uid);
        match planner.service.verify(&token).await {
            Verification::Confirmed(user) => {
                println!("Welcome, {}!", user.name);
                let uid = user.uid.clone();
                planner.session.login(user).await?;
                planner.selection.on_token_change(Some(&uid)).await;
                Ok(())
            }
            Verification::Rejected => {
                error!("The catalog service does not recognize this user ID");
                Err(Error::Command)
            }
            Verification::Ambiguous(reason) => {
                error!("We could not reach the catalog service to log in: {}", reason);
                Err(Error::Command)
            }
        }
    }
}
