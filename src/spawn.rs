//! Bridging suspended computations onto an executor through a token.
//!
//! [`spawn_with`] is the canonical initiating operation of this crate: it
//! drives a [`Completion`]-valued future on an executor and delivers the
//! outcome through whatever token the caller supplies. The group
//! combinators launch every member through it with an internal observer
//! token; callers use it directly to obtain futures, callbacks, or
//! fire-and-forget delivery for their own tasks.
//!
//! Spawn rejection does not surface as a second error channel. The rejected
//! driver drops with its handler, and the token's abandonment path reports
//! the failure through the ordinary delivery channel.

use core::future::Future;

use futures::task::{Spawn, SpawnExt};

use crate::error::Completion;
use crate::handler::Handler;
use crate::signature::Fallible;
use crate::token::{Token, WithDefault};
use crate::tracing_compat::debug;

/// Runs `future` on `spawner`, delivering its outcome through `token`.
///
/// Returns the token's delivery artifact immediately: a [`Settlement`]
/// future for [`Promised`], nothing for [`Callback`] or [`Detached`].
///
/// [`Settlement`]: crate::token::Settlement
/// [`Promised`]: crate::token::Promised
/// [`Callback`]: crate::handler::Callback
/// [`Detached`]: crate::token::Detached
pub fn spawn_with<Sp, F, T, Tk>(spawner: &Sp, future: F, token: Tk) -> Tk::Output
where
    Sp: Spawn,
    F: Future<Output = Completion<T>> + Send + 'static,
    Tk: Token<Fallible<T>>,
    Tk::Handler: Send + 'static,
{
    token.initiate(move |handler| {
        let driver = async move {
            let outcome = future.await;
            handler.complete(outcome);
        };
        if spawner.spawn(driver).is_err() {
            // The rejected driver owned the handler; its drop is what
            // reports abandonment inward.
            debug!("executor rejected completion driver");
        }
    })
}

impl<E, Tk> WithDefault<E, Tk> {
    /// Runs `future` on the carried executor, delivering through the
    /// carried default token.
    ///
    /// This is the omitted-token form of [`spawn_with`]: the call site names
    /// no token and the default bound to this executor applies.
    pub fn spawn<F, T>(&self, future: F) -> Tk::Output
    where
        E: Spawn,
        F: Future<Output = Completion<T>> + Send + 'static,
        Tk: Token<Fallible<T>> + Clone,
        Tk::Handler: Send + 'static,
    {
        spawn_with(self.executor(), future, self.issue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Fault};
    use crate::token::{Promised, TokenExt};
    use futures::executor::{block_on, LocalPool};

    #[test]
    fn spawn_with_delivers_success() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let settlement = spawn_with(&spawner, async { Ok(40_u32) }, Promised);

        let outcome = pool.run_until(settlement);
        assert_eq!(outcome.unwrap(), 40);
    }

    #[test]
    fn spawn_with_delivers_faults() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let settlement = spawn_with(
            &spawner,
            async { Err::<u32, _>(Fault::from("boom")) },
            Promised,
        );

        let outcome = pool.run_until(settlement);
        assert_eq!(outcome.unwrap_err().code(), Some(ErrorKind::User));
    }

    #[test]
    fn rejected_spawn_reports_abandonment() {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        drop(pool);

        let settlement = spawn_with(&spawner, async { Ok(1_u32) }, Promised);

        let outcome = block_on(settlement);
        assert_eq!(outcome.unwrap_err().code(), Some(ErrorKind::Abandoned));
    }

    #[test]
    fn with_default_spawn_resolves_the_omitted_token() {
        let mut pool = LocalPool::new();
        let agent = Promised.as_code().as_default_on(pool.spawner());

        let settlement = agent.spawn(async { Err::<u32, _>(Fault::cancelled()) });

        let outcome = pool.run_until(settlement);
        assert_eq!(outcome, Err(ErrorKind::Cancelled));
    }
}
