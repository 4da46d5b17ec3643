// channel.rs

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{
    channel::{mpsc, oneshot},
    stream::{StreamExt, TakeUntil},
};
use log::*;
use serde::Serialize;

use crate::{format_reading, Payload, Sensors};

pub const CHANNEL_COUNT: usize = 4;

static CONNECTION_SERIAL: AtomicU64 = AtomicU64::new(1);

/// One of the fixed SSE channels, numbered from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(u8);

impl ChannelId {
    pub fn new(id: u8) -> Option<Self> {
        (1..=CHANNEL_COUNT as u8).contains(&id).then_some(ChannelId(id))
    }

    pub fn all() -> impl Iterator<Item = ChannelId> {
        (1..=CHANNEL_COUNT as u8).map(ChannelId)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn path(self) -> String {
        format!("/connect-client{}", self.0)
    }

    pub fn metric(self) -> Metric {
        match self.0 {
            1 => Metric::TemperatureC,
            2 => Metric::Humidity,
            3 => Metric::Pressure,
            _ => Metric::TemperatureF,
        }
    }

    fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Metric {
    TemperatureC,
    Humidity,
    Pressure,
    TemperatureF,
}

impl Metric {
    pub fn read<S: Sensors + ?Sized>(self, sensors: &mut S) -> anyhow::Result<f32> {
        match self {
            Metric::TemperatureC => sensors.temperature_c(),
            Metric::Humidity => sensors.relative_humidity(),
            Metric::Pressure => sensors.pressure_hpa(),
            Metric::TemperatureF => sensors.temperature_f(),
        }
    }

    /// Unit suffix the dashboard appends client-side.
    pub fn unit(self) -> &'static str {
        match self {
            Metric::TemperatureC => "°C",
            Metric::Humidity => "%",
            Metric::Pressure => " hPa",
            Metric::TemperatureF => "°F",
        }
    }

    /// Element on the dashboard page showing this metric.
    pub fn element_id(self) -> &'static str {
        match self {
            Metric::TemperatureC => "tempc",
            Metric::Humidity => "humid",
            Metric::Pressure => "press",
            Metric::TemperatureF => "tempf",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::TemperatureC => "temperature",
            Metric::Humidity => "humidity",
            Metric::Pressure => "pressure",
            Metric::TemperatureF => "temperature_f",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    #[error("peer disconnected")]
    Disconnected,
    #[error("previous event not delivered yet")]
    Full,
}

/// Event stream of one SSE response. Ends as soon as its connection is closed,
/// dropping anything still queued.
pub type SseStream = TakeUntil<mpsc::Receiver<Payload>, oneshot::Receiver<()>>;

/// Server end of one SSE response.
///
/// The receiving half becomes the response body. It holds a single pending event,
/// so a push never waits for the client.
#[derive(Debug)]
pub struct SseConnection {
    serial: u64,
    tx: mpsc::Sender<Payload>,
    cancel: Option<oneshot::Sender<()>>,
}

impl SseConnection {
    pub fn open() -> (Self, SseStream) {
        let (tx, rx) = mpsc::channel(0);
        let (cancel, cancelled) = oneshot::channel();
        let serial = CONNECTION_SERIAL.fetch_add(1, Ordering::Relaxed);
        let conn = SseConnection {
            serial,
            tx,
            cancel: Some(cancel),
        };
        (conn, rx.take_until(cancelled))
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn send_event(&mut self, data: Payload) -> Result<(), PushError> {
        self.tx.try_send(data).map_err(|e| {
            if e.is_disconnected() {
                PushError::Disconnected
            } else {
                PushError::Full
            }
        })
    }

    /// Ends the response stream. Nothing more is delivered, not even a queued event.
    pub fn close(&mut self) {
        self.tx.close_channel();
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct Channel {
    id: ChannelId,
    metric: Metric,
    format: fn(f32) -> Payload,
    connection: Option<SseConnection>,
}

impl Channel {
    fn new(id: ChannelId) -> Self {
        Channel {
            id,
            metric: id.metric(),
            format: format_reading,
            connection: None,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn format(&self, value: f32) -> Payload {
        (self.format)(value)
    }

    pub fn connection(&self) -> Option<&SseConnection> {
        self.connection.as_ref()
    }

    pub(crate) fn connection_mut(&mut self) -> Option<&mut SseConnection> {
        self.connection.as_mut()
    }
}

/// Current subscriber of every channel. At most one per channel, last one wins.
pub struct ChannelRegistry {
    channels: [Channel; CHANNEL_COUNT],
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        ChannelRegistry {
            channels: std::array::from_fn(|i| Channel::new(ChannelId(i as u8 + 1))),
        }
    }

    pub fn subscribe(&mut self, id: ChannelId, connection: SseConnection) {
        let channel = &mut self.channels[id.index()];
        if let Some(mut old) = channel.connection.take() {
            old.close();
            info!(
                "Channel {id} ({}): connection #{} replaced by #{}",
                channel.metric,
                old.serial,
                connection.serial
            );
        } else {
            info!(
                "Channel {id} ({}): connection #{} subscribed",
                channel.metric, connection.serial
            );
        }
        channel.connection = Some(connection);
    }

    pub fn current_connection(&self, id: ChannelId) -> Option<&SseConnection> {
        self.channels[id.index()].connection()
    }

    /// Forget the channel's connection if its peer has gone away.
    pub fn clear_if_broken(&mut self, id: ChannelId) {
        let channel = &mut self.channels[id.index()];
        if channel.connection.as_ref().is_some_and(SseConnection::is_closed) {
            if let Some(old) = channel.connection.take() {
                warn!(
                    "Channel {id} ({}): connection #{} lost, waiting for a new subscriber",
                    channel.metric, old.serial
                );
            }
        }
    }

    pub fn subscribed(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| c.connection.is_some())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.iter_mut()
    }
}


// EOF
