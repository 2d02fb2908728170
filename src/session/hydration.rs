// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use tokio::sync::watch;

use crate::error::{self, Result};

use super::State;

#[derive(Debug)]
pub(crate) enum View {
    Loading,
    Ready(State),
}

/// Holds back anything that branches on the session until the persisted
/// state has been loaded.
pub(crate) struct Gate {
    rx: watch::Receiver<State>,
}

impl Gate {
    pub(crate) const fn new(rx: watch::Receiver<State>) -> Self {
        Self { rx }
    }

    pub(crate) fn view(&self) -> View {
        let state = self.rx.borrow();
        if state.has_hydrated {
            View::Ready(state.clone())
        } else {
            View::Loading
        }
    }

    pub(crate) async fn opened(&mut self) -> Result<State> {
        let state = self
            .rx
            .wait_for(|state| state.has_hydrated)
            .await
            .map_err(error::Internal::from)?;
        Ok(state.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        session::{Data, Store, Token, Tokens},
        storage,
    };

    use super::*;

    #[tokio::test]
    async fn loading_until_hydrated() -> Result<()> {
        let store = Store::new(Box::new(storage::Memory::with(Data {
            tokens: Some(Tokens::new(Token::new("A1"), Token::new("R1"))),
            user: None,
        })));
        let mut gate = Gate::new(store.subscribe());
        assert!(matches!(gate.view(), View::Loading));

        let (state, ()) = tokio::join!(gate.opened(), store.hydrate());
        assert!(state?.is_authenticated());
        assert!(matches!(gate.view(), View::Ready(ref state) if state.is_authenticated()));
        Ok(())
    }

    #[tokio::test]
    async fn opened_fails_once_the_store_is_gone() {
        let store = Store::new(Box::new(storage::Memory::<Data>::new()));
        let mut gate = Gate::new(store.subscribe());
        drop(store);

        assert!(matches!(
            gate.opened().await,
            Err(error::Error::Internal(error::Internal::ChannelClosed))
        ));
    }
}
