use crate::error::RtError;
use crate::types::realtime::*;
use crate::types::{ChannelMessage, NotificationList};

/// Receives server-pushed events and connection changes.
///
/// Every method has an empty default, so implementors only override what they
/// care about. Methods run inside [`super::RtClient::tick`].
#[allow(unused_variables)]
pub trait RtClientListener: Send {
    fn on_connect(&mut self) {}
    fn on_disconnect(&mut self, info: DisconnectInfo) {}
    /// Errors that belong to no request: server `error` events, undecodable
    /// frames and transport failures while connected.
    fn on_error(&mut self, error: RtError) {}

    fn on_channel_message(&mut self, message: ChannelMessage) {}
    fn on_channel_presence(&mut self, event: ChannelPresenceEvent) {}
    fn on_match_data(&mut self, data: MatchData) {}
    fn on_match_presence(&mut self, event: MatchPresenceEvent) {}
    fn on_matchmaker_matched(&mut self, matched: MatchmakerMatched) {}
    fn on_notifications(&mut self, notifications: NotificationList) {}
    fn on_status_presence(&mut self, event: StatusPresenceEvent) {}
    fn on_stream_data(&mut self, data: StreamData) {}
    fn on_stream_presence(&mut self, event: StreamPresenceEvent) {}

    fn on_party(&mut self, party: Party) {}
    fn on_party_close(&mut self, close: PartyClose) {}
    fn on_party_data(&mut self, data: PartyData) {}
    fn on_party_join_request(&mut self, request: PartyJoinRequest) {}
    fn on_party_leader(&mut self, leader: PartyLeader) {}
    fn on_party_matchmaker_ticket(&mut self, ticket: PartyMatchmakerTicket) {}
    fn on_party_presence(&mut self, event: PartyPresenceEvent) {}
}
