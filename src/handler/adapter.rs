//! Invocation adapter: turns application closures into callable handlers.
//!
//! Four handler shapes are supported. The first parameter is always the
//! connection [`Channel`]:
//!
//! | Signature | Arguments | Result |
//! |---|---|---|
//! | `Fn(Channel) -> HandlerResult<()>` | no | no |
//! | `Fn(Channel, T) -> HandlerResult<()>` | yes | no |
//! | `Fn(Channel) -> HandlerResult<Reply<R>>` | no | yes |
//! | `Fn(Channel, T) -> HandlerResult<Reply<R>>` | yes | yes |
//!
//! (each returning a future). The variant is resolved once at registration
//! through [`IntoHandler`], so dispatch never re-inspects the closure.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::channel::Channel;
use crate::codec::PayloadFormat;
use crate::error::{BoxError, Result, SockwireError};

/// Result type for handler functions.
pub type HandlerResult<T = ()> = std::result::Result<T, BoxError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased handler.
pub trait Handler: Send + Sync + 'static {
    /// Decode `payload` if needed, call the handler and encode its result.
    fn call(
        &self,
        channel: Channel,
        payload: &[u8],
        format: PayloadFormat,
    ) -> BoxFuture<'static, Result<Option<Bytes>>>;
}

/// Value a handler resolves to.
///
/// `()` means the handler produces nothing; [`Reply`] carries the single
/// value sent back in an ack response.
pub trait HandlerOutput: Send + 'static {
    /// Whether this output is sent back to ack requests.
    const PRODUCES_RESULT: bool;

    /// Encode the output, `None` when there is nothing to send.
    fn into_payload(self, format: PayloadFormat) -> Result<Option<Bytes>>;
}

impl HandlerOutput for () {
    const PRODUCES_RESULT: bool = false;

    fn into_payload(self, _format: PayloadFormat) -> Result<Option<Bytes>> {
        Ok(None)
    }
}

/// Result of an ack-capable handler.
///
/// ```ignore
/// dispatcher.on("echo", |_ch: Channel, msg: Echo| async move { Ok(Reply(msg)) })?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<R>(pub R);

impl<R: Serialize + Send + 'static> HandlerOutput for Reply<R> {
    const PRODUCES_RESULT: bool = true;

    fn into_payload(self, format: PayloadFormat) -> Result<Option<Bytes>> {
        format.encode(&self.0).map(Some)
    }
}

/// Marker for handlers taking only the channel.
pub struct NoArgs;

/// Marker for handlers taking the channel and a decoded `T`.
pub struct WithArgs<T>(PhantomData<fn() -> T>);

/// Conversion from a closure into a type-erased [`Handler`].
///
/// `M` is a marker ([`NoArgs`] or [`WithArgs`]) inferred from the closure's
/// arity; callers never name it.
pub trait IntoHandler<M>: Send + Sync + Sized + 'static {
    /// Whether the payload is decoded before the call.
    const ACCEPTS_ARGUMENTS: bool;

    /// Whether the handler's value is sent back to ack requests.
    const PRODUCES_RESULT: bool;

    /// Name of the argument type, if any.
    fn argument_type() -> Option<&'static str>;

    /// Erase the closure.
    fn into_handler(self) -> Box<dyn Handler>;
}

impl<F, Fut, O> IntoHandler<NoArgs> for F
where
    F: Fn(Channel) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<O>> + Send + 'static,
    O: HandlerOutput,
{
    const ACCEPTS_ARGUMENTS: bool = false;
    const PRODUCES_RESULT: bool = O::PRODUCES_RESULT;

    fn argument_type() -> Option<&'static str> {
        None
    }

    fn into_handler(self) -> Box<dyn Handler> {
        Box::new(BareHandler {
            handler: self,
            _phantom: PhantomData::<fn() -> O>,
        })
    }
}

impl<F, T, Fut, O> IntoHandler<WithArgs<T>> for F
where
    F: Fn(Channel, T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult<O>> + Send + 'static,
    O: HandlerOutput,
{
    const ACCEPTS_ARGUMENTS: bool = true;
    const PRODUCES_RESULT: bool = O::PRODUCES_RESULT;

    fn argument_type() -> Option<&'static str> {
        Some(std::any::type_name::<T>())
    }

    fn into_handler(self) -> Box<dyn Handler> {
        Box::new(TypedHandler {
            handler: self,
            _phantom: PhantomData::<fn(T) -> O>,
        })
    }
}

/// Handler that ignores the payload.
struct BareHandler<F, O> {
    handler: F,
    _phantom: PhantomData<fn() -> O>,
}

impl<F, Fut, O> Handler for BareHandler<F, O>
where
    F: Fn(Channel) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<O>> + Send + 'static,
    O: HandlerOutput,
{
    fn call(
        &self,
        channel: Channel,
        _payload: &[u8],
        format: PayloadFormat,
    ) -> BoxFuture<'static, Result<Option<Bytes>>> {
        let fut = (self.handler)(channel);
        Box::pin(async move {
            let output = fut.await.map_err(SockwireError::HandlerExecution)?;
            output.into_payload(format)
        })
    }
}

/// Wrapper that decodes the payload into `T` before calling the handler.
struct TypedHandler<F, T, O> {
    handler: F,
    _phantom: PhantomData<fn(T) -> O>,
}

impl<F, T, Fut, O> Handler for TypedHandler<F, T, O>
where
    F: Fn(Channel, T) -> Fut + Send + Sync + 'static,
    T: DeserializeOwned + Send + 'static,
    Fut: Future<Output = HandlerResult<O>> + Send + 'static,
    O: HandlerOutput,
{
    fn call(
        &self,
        channel: Channel,
        payload: &[u8],
        format: PayloadFormat,
    ) -> BoxFuture<'static, Result<Option<Bytes>>> {
        let args: T = match format.decode(payload) {
            Ok(v) => v,
            Err(e) => {
                let err = SockwireError::PayloadDecode(e.to_string());
                return Box::pin(async move { Err(err) });
            }
        };

        let fut = (self.handler)(channel, args);
        Box::pin(async move {
            let output = fut.await.map_err(SockwireError::HandlerExecution)?;
            output.into_payload(format)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Text {
        text: String,
    }

    fn channel() -> Channel {
        Channel::new("test", &Config::default()).0
    }

    fn erase<M, H: IntoHandler<M>>(handler: H) -> (bool, bool, Box<dyn Handler>) {
        (H::ACCEPTS_ARGUMENTS, H::PRODUCES_RESULT, handler.into_handler())
    }

    #[test]
    fn test_shapes_resolved_from_signature() {
        let (args, result, _) = erase(|_ch: Channel| async { Ok(()) });
        assert_eq!((args, result), (false, false));

        let (args, result, _) = erase(|_ch: Channel, _t: Text| async { Ok(()) });
        assert_eq!((args, result), (true, false));

        let (args, result, _) = erase(|_ch: Channel| async { Ok(Reply(1u8)) });
        assert_eq!((args, result), (false, true));

        let (args, result, _) = erase(|_ch: Channel, t: Text| async move { Ok(Reply(t)) });
        assert_eq!((args, result), (true, true));
    }

    #[test]
    fn test_argument_type_name() {
        fn type_of<M, H: IntoHandler<M>>(_: &H) -> Option<&'static str> {
            H::argument_type()
        }

        let bare = |_ch: Channel| async { Ok(()) };
        let typed = |_ch: Channel, _t: Text| async { Ok(()) };

        assert_eq!(type_of(&bare), None);
        assert!(type_of(&typed).unwrap().ends_with("Text"));
    }

    #[tokio::test]
    async fn test_typed_handler_decodes_and_replies() {
        let (_, _, handler) = erase(|_ch: Channel, t: Text| async move {
            Ok(Reply(Text {
                text: t.text.to_uppercase(),
            }))
        });

        let out = handler
            .call(channel(), br#"{"text":"hi"}"#, PayloadFormat::Json)
            .await
            .unwrap();

        assert_eq!(out.as_deref(), Some(&br#"{"text":"HI"}"#[..]));
    }

    #[tokio::test]
    async fn test_decode_failure_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let (_, _, handler) = erase(move |_ch: Channel, _t: Text| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let result = handler
            .call(channel(), br#"{"wrong":true}"#, PayloadFormat::Json)
            .await;

        assert!(matches!(result, Err(SockwireError::PayloadDecode(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bare_handler_ignores_payload() {
        let (_, _, handler) = erase(|_ch: Channel| async { Ok(Reply("pong")) });

        let out = handler
            .call(channel(), b"garbage", PayloadFormat::Json)
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some(&br#""pong""#[..]));
    }

    #[tokio::test]
    async fn test_handler_error_surfaces() {
        let (_, _, handler) = erase(|_ch: Channel| async {
            Err::<(), BoxError>("boom".into())
        });

        let result = handler.call(channel(), b"", PayloadFormat::Json).await;
        match result {
            Err(SockwireError::HandlerExecution(e)) => assert_eq!(e.to_string(), "boom"),
            other => panic!("expected handler error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_result_yields_none() {
        let (_, _, handler) = erase(|_ch: Channel, _n: i32| async { Ok(()) });

        let out = handler.call(channel(), b"3", PayloadFormat::Json).await.unwrap();
        assert!(out.is_none());
    }
}
