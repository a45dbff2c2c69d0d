//! # Dispatch Resolver
//!
//! Routes terminal completion events to the registry that holds the
//! continuation for their handle. The resolver is driven from `tick()` only,
//! so every user callback runs on the thread that owns the client.
//!
//! Each client declares its result shapes with [`reply_registries!`], which
//! generates one [`CallbackRegistry`] per shape plus the lookup glue. Errors
//! share a single registry keyed by the same handles.
//!
//! ## Routing
//!
//! - Success: the payload is decoded into the shape recorded when the request
//!   was issued and handed to the success continuation. The handle's error
//!   continuation is dropped.
//! - Error: the success continuation is dropped and the error goes to the
//!   request's error continuation, the client-wide default, or the log, in
//!   that order.
//! - A completion for a handle that is no longer in flight (timed out or
//!   abandoned by `disconnect`) is discarded.

use crate::error::{ErrorCode, NakamaError, RtError, RtErrorCode};
use crate::handle::{HandleAllocator, RequestHandle};
use crate::registry::{Callback, CallbackRegistry};
use crate::session::{AuthResponse, Session};
use crate::types::realtime::*;
use crate::types::*;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Client-wide fallback for errors nobody registered a callback for.
pub type DefaultErrorCallback<E> = Box<dyn FnMut(E) + Send + 'static>;

/// Converts a decoded JSON payload into a result shape.
pub trait FromPayload: Sized {
    fn from_payload(payload: Value) -> Result<Self, String>;
}

impl FromPayload for () {
    fn from_payload(_payload: Value) -> Result<Self, String> {
        Ok(())
    }
}

impl FromPayload for Session {
    fn from_payload(payload: Value) -> Result<Self, String> {
        let response: AuthResponse = serde_json::from_value(payload).map_err(|e| e.to_string())?;
        Session::from_auth_response(response).map_err(|e| e.to_string())
    }
}

macro_rules! json_payload {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromPayload for $ty {
                fn from_payload(payload: Value) -> Result<Self, String> {
                    serde_json::from_value(payload).map_err(|e| e.to_string())
                }
            }
        )+
    };
}

json_payload!(
    Account,
    Users,
    FriendList,
    Group,
    GroupList,
    GroupUserList,
    UserGroupList,
    LeaderboardRecord,
    LeaderboardRecordList,
    TournamentList,
    MatchList,
    NotificationList,
    ChannelMessageList,
    StorageObjectList,
    StorageObjects,
    StorageObjectAcks,
    Rpc,
    Channel,
    ChannelMessageAck,
    RtMatch,
    MatchmakerTicket,
    Status,
    Party,
    PartyJoinRequest,
    PartyMatchmakerTicket,
);

/// Error payloads the dispatcher can synthesize locally.
pub trait ReplyError: fmt::Display + Send + 'static {
    /// A success payload did not match the expected shape.
    fn decode_failed(reason: String) -> Self;
    /// The request outlived the configured timeout.
    fn timed_out(after: Duration) -> Self;
}

impl ReplyError for NakamaError {
    fn decode_failed(reason: String) -> Self {
        NakamaError::new(ErrorCode::InternalError, format!("failed to decode response: {reason}"))
    }

    fn timed_out(after: Duration) -> Self {
        NakamaError::new(ErrorCode::DeadlineExceeded, format!("no response after {} ms", after.as_millis()))
    }
}

impl ReplyError for RtError {
    fn decode_failed(reason: String) -> Self {
        RtError::new(RtErrorCode::TransportError, format!("failed to decode response: {reason}"))
    }

    fn timed_out(after: Duration) -> Self {
        RtError::new(RtErrorCode::TransportError, format!("no response after {} ms", after.as_millis()))
    }
}

/// The set of typed registries belonging to one client.
pub trait ReplyRegistries: Default {
    type Kind: Copy + fmt::Debug + Send;

    /// Decodes `payload` and runs the continuation stored for `handle` in the
    /// registry for `kind`. Returns `Ok(false)` when nothing was registered,
    /// in which case the payload is not decoded at all.
    fn resolve(&mut self, kind: Self::Kind, handle: RequestHandle, payload: Value) -> Result<bool, String>;
    fn discard(&mut self, kind: Self::Kind, handle: RequestHandle) -> bool;
    fn clear(&mut self);
    fn len(&self) -> usize;
}

/// Maps a result type to its registry inside a [`ReplyRegistries`] set.
pub trait Slot<T>: ReplyRegistries {
    const KIND: <Self as ReplyRegistries>::Kind;
    fn slot(&mut self) -> &mut CallbackRegistry<T>;
}

/// Declares a registry set: a kind enum, a struct with one
/// [`CallbackRegistry`] per result type, and the [`ReplyRegistries`] and
/// [`Slot`] impls tying them together. Each result type may appear once.
macro_rules! reply_registries {
    (
        $(#[$meta:meta])*
        pub struct $name:ident, kind $kind:ident {
            $($field:ident: $variant:ident => $ty:ty),+ $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $kind {
            $($variant),+
        }

        $(#[$meta])*
        #[derive(Debug, Default)]
        pub struct $name {
            $(pub $field: $crate::registry::CallbackRegistry<$ty>,)+
        }

        impl $crate::dispatch::ReplyRegistries for $name {
            type Kind = $kind;

            fn resolve(
                &mut self,
                kind: $kind,
                handle: $crate::handle::RequestHandle,
                payload: serde_json::Value,
            ) -> Result<bool, String> {
                match kind {
                    $(
                        $kind::$variant => {
                            if !self.$field.contains(handle) {
                                return Ok(false);
                            }
                            match <$ty as $crate::dispatch::FromPayload>::from_payload(payload) {
                                Ok(value) => Ok(self.$field.resolve(handle, value)),
                                Err(reason) => {
                                    self.$field.discard(handle);
                                    Err(reason)
                                }
                            }
                        }
                    )+
                }
            }

            fn discard(&mut self, kind: $kind, handle: $crate::handle::RequestHandle) -> bool {
                match kind {
                    $($kind::$variant => self.$field.discard(handle),)+
                }
            }

            fn clear(&mut self) {
                $(self.$field.clear();)+
            }

            fn len(&self) -> usize {
                0 $(+ self.$field.len())+
            }
        }

        $(
            impl $crate::dispatch::Slot<$ty> for $name {
                const KIND: $kind = $kind::$variant;

                fn slot(&mut self) -> &mut $crate::registry::CallbackRegistry<$ty> {
                    &mut self.$field
                }
            }
        )+
    };
}
pub(crate) use reply_registries;

#[derive(Debug, Clone, Copy)]
struct InFlight<K> {
    kind: K,
    issued_at: Instant,
}

/// Owns the handle allocator, the typed registries and the shared error
/// registry of one client.
pub struct Dispatcher<R: ReplyRegistries, E: ReplyError> {
    allocator: HandleAllocator,
    registries: R,
    errors: CallbackRegistry<E>,
    in_flight: HashMap<RequestHandle, InFlight<R::Kind>>,
    default_error: Option<DefaultErrorCallback<E>>,
    timeout: Option<Duration>,
}

impl<R: ReplyRegistries, E: ReplyError> Dispatcher<R, E> {
    /// Creates a dispatcher. `timeout` of `None` lets requests pend until the
    /// connection is torn down.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            allocator: HandleAllocator::new(),
            registries: R::default(),
            errors: CallbackRegistry::new(),
            in_flight: HashMap::new(),
            default_error: None,
            timeout,
        }
    }

    pub fn set_default_error(&mut self, callback: Option<DefaultErrorCallback<E>>) {
        self.default_error = callback;
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Registers the callbacks for a new request.
    ///
    /// A handle is allocated only when at least one callback is supplied;
    /// otherwise the call is fire-and-forget and [`RequestHandle::NONE`] is
    /// returned with nothing registered.
    pub fn issue<T>(&mut self, on_success: Option<Callback<T>>, on_error: Option<Callback<E>>) -> RequestHandle
    where
        R: Slot<T>,
    {
        if on_success.is_none() && on_error.is_none() {
            return RequestHandle::NONE;
        }

        let handle = self.allocator.next_handle();
        if let Some(callback) = on_success {
            <R as Slot<T>>::slot(&mut self.registries).register(handle, callback);
        }
        if let Some(callback) = on_error {
            self.errors.register(handle, callback);
        }
        self.in_flight.insert(
            handle,
            InFlight {
                kind: <R as Slot<T>>::KIND,
                issued_at: Instant::now(),
            },
        );
        handle
    }

    /// Allocates a handle without registering anything, for requests that
    /// still need a correlation id on the wire.
    pub fn allocate(&mut self) -> RequestHandle {
        self.allocator.next_handle()
    }

    /// Delivers a successful completion.
    pub fn dispatch_success(&mut self, handle: RequestHandle, payload: Value) {
        if handle.is_none() {
            return;
        }
        let Some(entry) = self.in_flight.remove(&handle) else {
            debug!(handle = %handle, "Dropping completion for a request that is no longer pending");
            return;
        };

        match self.registries.resolve(entry.kind, handle, payload) {
            Ok(_) => {
                self.errors.discard(handle);
            }
            Err(reason) => {
                warn!(handle = %handle, kind = ?entry.kind, "❌ Response did not match the expected shape: {}", reason);
                self.route_error(handle, E::decode_failed(reason));
            }
        }
    }

    /// Delivers a failed completion. [`RequestHandle::NONE`] goes straight to
    /// the default error callback.
    pub fn dispatch_error(&mut self, handle: RequestHandle, error: E) {
        if !handle.is_none() {
            let Some(entry) = self.in_flight.remove(&handle) else {
                debug!(handle = %handle, "Dropping error for a request that is no longer pending");
                return;
            };
            self.registries.discard(entry.kind, handle);
        }
        self.route_error(handle, error);
    }

    /// Reports an error that belongs to no request at all.
    pub fn report_error(&mut self, error: E) {
        self.route_error(RequestHandle::NONE, error);
    }

    fn route_error(&mut self, handle: RequestHandle, error: E) {
        if self.errors.contains(handle) {
            self.errors.resolve(handle, error);
        } else if let Some(callback) = self.default_error.as_mut() {
            callback(error);
        } else {
            warn!(handle = %handle, "❌ Error not handled: {}", error);
        }
    }

    /// Fails every request that has been pending for at least the configured
    /// timeout. Returns how many requests expired.
    pub fn expire(&mut self, now: Instant) -> usize {
        let Some(timeout) = self.timeout else {
            return 0;
        };

        let mut expired: Vec<RequestHandle> = self
            .in_flight
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.issued_at) >= timeout)
            .map(|(handle, _)| *handle)
            .collect();
        expired.sort();

        for handle in &expired {
            warn!(handle = %handle, timeout_ms = timeout.as_millis() as u64, "⏰ Request timed out");
            self.dispatch_error(*handle, E::timed_out(timeout));
        }
        expired.len()
    }

    /// Fails every pending request with the error built by `make_error`.
    pub fn fail_all(&mut self, mut make_error: impl FnMut() -> E) {
        for handle in self.pending_handles() {
            self.dispatch_error(handle, make_error());
        }
    }

    /// Pending handles in issue order.
    pub fn pending_handles(&self) -> Vec<RequestHandle> {
        let mut handles: Vec<RequestHandle> = self.in_flight.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Forgets every pending request without invoking any callback.
    pub fn abandon_all(&mut self) -> usize {
        let abandoned = self.in_flight.len();
        self.registries.clear();
        self.errors.clear();
        self.in_flight.clear();
        abandoned
    }

    pub fn is_pending(&self, handle: RequestHandle) -> bool {
        self.in_flight.contains_key(&handle)
    }

    /// Number of requests awaiting a completion.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Total continuations stored across every registry, errors included.
    pub fn registered(&self) -> usize {
        self.registries.len() + self.errors.len()
    }
}

impl<R: ReplyRegistries, E: ReplyError> fmt::Debug for Dispatcher<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.in_flight.len())
            .field("registered", &self.registered())
            .field("default_error", &self.default_error.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
