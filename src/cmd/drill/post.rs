// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use knos_core::reveal::Intent;
use maud::html;
use serde::Deserialize;

use crate::cmd::drill::state::ServerState;
use crate::cmd::drill::template::page_template;
use crate::error::Fallible;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Action {
    Correct,
    Incorrect,
    Skip,
    Continue,
    Quit,
    Next,
    End,
    Shutdown,
}

#[derive(Deserialize)]
pub struct FormData {
    action: Action,
}

pub async fn post_handler(
    State(state): State<ServerState>,
    Form(form): Form<FormData>,
) -> Response {
    if form.action == Action::Shutdown {
        shutdown(&state);
        let body = html! {
            div.finished {
                p { "The server has stopped. You can close this tab." }
            }
        };
        return Html(page_template(body).into_string()).into_response();
    }
    match action_handler(&state, form.action) {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            log::error!("{e}");
            let body = html! {
                div.error {
                    p { (e.to_string()) }
                    a href="/" { "Back" }
                }
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(page_template(body).into_string()),
            )
                .into_response()
        }
    }
}

fn action_handler(state: &ServerState, action: Action) -> Fallible<()> {
    let mut mutable = state.mutable.lock().unwrap();
    log::debug!("Action: {action:?}");
    match action {
        Action::Correct => mutable.apply(Intent::Correct),
        Action::Incorrect => mutable.apply(Intent::Incorrect),
        Action::Skip => mutable.apply(Intent::SkipBlock),
        Action::Continue => mutable.apply(Intent::Continue),
        Action::Quit => mutable.apply(Intent::Quit),
        Action::Next => mutable.next_card(),
        Action::End => mutable.end(),
        Action::Shutdown => Ok(()),
    }
}

fn shutdown(state: &ServerState) {
    if let Some(tx) = state.shutdown_tx.lock().unwrap().take() {
        let _ = tx.send(());
    }
}
