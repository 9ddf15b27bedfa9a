// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Subcommand;
use course_planner::error::{Error, Result};
use log::{error, warn};

use super::{print_selection, Planner};

/// Work with the courses selected for the coming term.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Show the selected courses.
    Show,

    /// Add a course to the selection.
    Add {
        /// The catalog code of the course, such as CS101.
        code: String,
    },

    /// Remove a course from the selection.
    Remove {
        /// The catalog code of the course.
        code: String,
    },

    /// Remove every selected course.
    Clear,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, planner: &Planner) -> Result<()> {
        let token = planner.identity().await?;
        planner.selection.on_mount(&token).await;

        let outcome = match self {
            Self::Show => Ok(planner.selection.selection()),
            Self::Add { code } => {
                if planner.selection.is_selected(&code) {
                    warn!("{} is already in your selection", code);
                    Ok(planner.selection.selection())
                } else {
                    planner
                        .selection
                        .add_course(&token, &code)
                        .await
                        .map_err(|e| {
                            match planner.selection.notice() {
                                Some(notice) => error!("{}", notice.message()),
                                None => error!("{}", e.user_message()),
                            }
                            Error::Command
                        })
                }
            }
            Self::Remove { code } => planner
                .selection
                .remove_course(&token, &code)
                .await
                .map_err(Error::from),
            Self::Clear => planner
                .selection
                .clear_selection(&token)
                .await
                .map_err(Error::from),
        };

        planner.selection.on_unmount();
        print_selection(&outcome?);
        Ok(())
    }
}
