// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use course_planner::{
    error::{Error, Result},
    model::{Selection, Token},
    service, storage, Config, SelectionSynchronizer, SessionCache,
};
use futures_util::lock::Mutex;
use log::error;
use tabled::{settings::Style, Table};

pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod plan;
pub(crate) mod status;

type Service = Arc<service::Http>;
type TokenStorage = Box<dyn storage::Storage<Token>>;

/// Everything a command needs, wired once per process.
pub(crate) struct Planner {
    pub(crate) service: Service,
    pub(crate) session: SessionCache<Service, TokenStorage>,
    pub(crate) selection: SelectionSynchronizer<Service>,
}

impl Planner {
    pub(crate) fn new(config: &Config, service: Service, storage: TokenStorage) -> Self {
        Self {
            session: SessionCache::new(Arc::clone(&service), Arc::new(Mutex::new(storage)))
                .with_policy(config.ambiguous_auth_policy()),
            selection: SelectionSynchronizer::new(Arc::clone(&service))
                .with_notice_window(config.notice_window()),
            service,
        }
    }

    /// The token of the logged-in user, or an error telling them to log in.
    pub(crate) async fn identity(&self) -> Result<Token> {
        let _ = self.session.check_authentication(false).await?;
        self.session.identity().await?.ok_or_else(|| {
            error!("You need to log in before working with your course plan");
            Error::Command
        })
    }
}

pub(crate) fn print_selection(selection: &Selection) {
    if selection.is_empty() {
        println!("No courses selected.");
    } else {
        println!(
            "{}",
            Table::new(selection.courses()).with(Style::rounded())
        );
    }
    println!(
        "{} of {} courses selected, {} credits in total",
        selection.len(),
        selection.capacity(),
        selection.total_credits()
    );
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, planner: &Planner) -> Result<()>;
}
