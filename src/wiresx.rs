/*! WiresX control-protocol engine.

WiresX is the control protocol a Fusion radio speaks to pick talk
groups and browse the directory. Commands arrive as multi-fragment
data frames, get reassembled into a command buffer, and answered with
fixed-layout reply frames: every byte offset below is part of the air
interface and radios are strict about them.

The engine is single threaded and owns no time source. The gateway
calls [`WiresX::process`] for every inbound data fragment and
[`WiresX::clock`] on a steady cadence (roughly every 10 ms) with a
monotonic millisecond reading. Status replies are deferred by one
second, the way the real node software behaves, and outbound frames
are paced so the radio is never flooded.

Connect and disconnect replies are not sent from the deferred timer:
the surrounding bridge confirms those explicitly once the destination
change has actually happened on the DMR side.
 */
use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::crc;
use crate::registry::Registry;
use crate::sink::FrameSink;

// Command tokens, matched against bytes [1..4] of a reassembled
// command, and the tokens of the replies to them.
const DX_REQ: [u8; 3] = [0x5D, 0x71, 0x5F];
const CONN_REQ: [u8; 3] = [0x5D, 0x23, 0x5F];
const DISC_REQ: [u8; 3] = [0x5D, 0x2A, 0x5F];
const ALL_REQ: [u8; 3] = [0x5D, 0x66, 0x5F];
const CAT_REQ: [u8; 3] = [0x5D, 0x67, 0x5F];

const DX_RESP: [u8; 4] = [0x5D, 0x51, 0x5F, 0x26];
const CONN_RESP: [u8; 4] = [0x5D, 0x41, 0x5F, 0x26];
const DISC_RESP: [u8; 4] = [0x5D, 0x41, 0x5F, 0x26];
const ALL_RESP: [u8; 4] = [0x5D, 0x46, 0x5F, 0x26];

/// Frame information value for communications channel frames.
const FI_COMMUNICATIONS: u8 = 0x01;
/// Data type value for data full-rate frames.
const DT_DATA_FR_MODE: u8 = 0x01;

const END_OF_DATA: u8 = 0x03;
const RECORD_SEP: u8 = 0x0D;

/// Reassembly buffer size; no command is longer.
const BUFFER_LEN: usize = 300;
/// Delay before a queued status reply is built and sent.
const REPLY_DELAY_MS: u64 = 1000;
/// Minimum spacing between transmitted frames.
const TX_INTERVAL_MS: u64 = 90;
/// Directory records per reply page.
const PAGE_LEN: usize = 20;
/// Bytes per directory record in a reply page.
const RECORD_LEN: usize = 50;

const DX_REPLY_LEN: usize = 129;
const CONNECT_REPLY_LEN: usize = 91;
const ALL_REPLY_LEN: usize = 1031;
const NOT_FOUND_REPLY_LEN: usize = 31;

/// Outcome of processing one inbound fragment, reported to the
/// bridge so it can act on connects and disconnects.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    /// Nothing actionable: not a command, a partial command, or a
    /// command the engine answers entirely by itself.
    None,
    /// The radio asked for the link status.
    Dx,
    /// The radio asked to connect to [`WiresX::dst_id`].
    Connect,
    /// The radio asked to drop the current link.
    Disconnect,
    /// The radio asked for a directory page.
    All,
    /// A complete command with an unknown token.
    Fail,
}

/// Which deferred reply the 1 s timer owes the radio.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Pending {
    #[default]
    None,
    Dx,
    Connect,
    Disconnect,
    All,
    Search,
    Category,
}

/// One WiresX session, a singleton per gateway.
pub struct WiresX<S> {
    callsign: String,
    node: String,
    id: String,
    name: String,
    tx_frequency: u32,
    rx_frequency: u32,
    dst_id: u32,
    full_dst_id: u32,
    registry: Registry,
    sink: S,
    strict_crc: bool,
    command: [u8; BUFFER_LEN],
    seq_no: u8,
    pending: Pending,
    start: usize,
    search: String,
    queue: VecDeque<Vec<u8>>,
    reply_due: Option<u64>,
    last_tx: u64,
    now: u64,
}

impl<S: FrameSink> WiresX<S> {
    /// Create a session.
    ///
    /// `node` on the air is the trimmed callsign joined to `suffix`
    /// with a dash, and the 5 digit node id is derived from the
    /// repeater name, so the same name always lands on the same id.
    pub fn new(
        callsign: &str,
        suffix: &str,
        name: &str,
        tx_frequency: u32,
        rx_frequency: u32,
        registry: Registry,
        sink: S,
    ) -> Self {
        let callsign = callsign.trim();
        let node = if suffix.trim().is_empty() {
            callsign.to_string()
        } else {
            format!("{}-{}", callsign, suffix.trim())
        };
        Self {
            id: format!("{:05}", fnv1a32(name) % 100_000),
            callsign: pad(callsign, 10),
            node: pad(&node, 10),
            name: pad(name, 14),
            tx_frequency,
            rx_frequency,
            dst_id: 0,
            full_dst_id: 0,
            registry,
            sink,
            strict_crc: true,
            command: [0; BUFFER_LEN],
            seq_no: 0,
            pending: Pending::None,
            start: 0,
            search: String::new(),
            queue: VecDeque::new(),
            reply_due: None,
            last_tx: 0,
            now: 0,
        }
    }

    /// Accept commands whose trailing checksum byte does not verify.
    ///
    /// Some deployed senders never fill that byte in; a gateway that
    /// has to interoperate with them can opt out of enforcement.
    #[must_use]
    pub fn permissive_crc(mut self) -> Self {
        self.strict_crc = false;
        self
    }

    /// Gateway callsign, 10 characters.
    #[must_use]
    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// Node label sent in replies, 10 characters.
    #[must_use]
    pub fn node(&self) -> &str {
        &self.node
    }

    /// The derived 5 digit node id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current destination talk group, 0 when unlinked.
    #[must_use]
    pub fn dst_id(&self) -> u32 {
        self.dst_id
    }

    /// Full destination id for the DMR side of the bridge.
    #[must_use]
    pub fn full_dst_id(&self) -> u32 {
        self.full_dst_id
    }

    /// Frames queued but not yet transmitted.
    #[must_use]
    pub fn queued_frames(&self) -> usize {
        self.queue.len()
    }

    /// The sink frames are delivered to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Feed one inbound data fragment.
    ///
    /// `fi`, `dt`, `fragment_no` and `fragment_total` come straight
    /// from the YSF frame header; only communications-channel data
    /// full-rate fragments are looked at. The first fragment carries
    /// up to 20 command bytes, later ones up to 40 each. The command
    /// is dispatched once the terminal fragment lands, its end marker
    /// is found, and its trailing checksum verifies.
    pub fn process(
        &mut self,
        payload: &[u8],
        source: &str,
        fi: u8,
        dt: u8,
        fragment_no: u8,
        fragment_total: u8,
    ) -> Status {
        if dt != DT_DATA_FR_MODE || fi != FI_COMMUNICATIONS || fragment_no == 0 {
            return Status::None;
        }

        if fragment_no == 1 {
            let n = payload.len().min(20);
            self.command[..n].copy_from_slice(&payload[..n]);
        } else {
            let offset = 20 + (usize::from(fragment_no) - 2) * 40;
            if offset >= BUFFER_LEN {
                return Status::None;
            }
            let n = payload.len().min(40).min(BUFFER_LEN - offset);
            self.command[offset..offset + n].copy_from_slice(&payload[..n]);
        }
        if fragment_no != fragment_total {
            return Status::None;
        }

        let cmd_len = (usize::from(fragment_total) - 1) * 40 + 20;
        let scan_end = cmd_len.min(BUFFER_LEN - 2);
        let Some(end) = (0..=scan_end).rev().find(|&i| self.command[i] == END_OF_DATA) else {
            debug!("WiresX command from {source} has no end marker");
            return Status::None;
        };
        if self.strict_crc {
            let want = crc::checksum(&self.command[..=end]);
            let got = self.command[end + 1];
            if want != got {
                warn!("WiresX command from {source}: checksum {got:#04x}, expected {want:#04x}");
                return Status::None;
            }
        }

        let token = [self.command[1], self.command[2], self.command[3]];
        if token == DX_REQ {
            self.process_dx(source);
            Status::Dx
        } else if token == CONN_REQ {
            self.process_connect(source)
        } else if token == DISC_REQ {
            self.process_disconnect(source);
            Status::Disconnect
        } else if token == ALL_REQ {
            self.process_all(source);
            Status::All
        } else if token == CAT_REQ {
            self.process_category(source);
            Status::None
        } else {
            debug!("unknown WiresX command {token:02x?} from {source}");
            Status::Fail
        }
    }

    fn process_dx(&mut self, source: &str) {
        info!("received DX from {}", source.trim());
        self.pending = Pending::Dx;
        self.reply_due = Some(self.now + REPLY_DELAY_MS);
    }

    fn process_connect(&mut self, source: &str) -> Status {
        let digits = &self.command[4..10];
        let id = std::str::from_utf8(digits)
            .ok()
            .and_then(|text| text.trim().parse::<u32>().ok());
        match id {
            Some(id) if id > 0 => {
                info!("received Connect to {} from {}", id, source.trim());
                self.dst_id = id;
                self.full_dst_id = id;
                self.pending = Pending::Connect;
                Status::Connect
            }
            _ => {
                debug!("rejecting Connect with destination {digits:02x?}");
                Status::None
            }
        }
    }

    fn process_disconnect(&mut self, source: &str) {
        info!("received Disconnect from {}", source.trim());
        self.pending = Pending::Disconnect;
    }

    fn process_all(&mut self, source: &str) {
        let mode = [self.command[5], self.command[6]];
        let start = std::str::from_utf8(&self.command[7..10])
            .ok()
            .and_then(|text| text.trim().parse::<usize>().ok())
            .unwrap_or(0);
        // The radio counts from 1.
        let start = start.saturating_sub(1);

        if mode == *b"01" {
            info!("received All request from {}, start {}", source.trim(), start);
            self.start = start;
            self.pending = Pending::All;
            self.reply_due = Some(self.now + REPLY_DELAY_MS);
        } else if mode == *b"11" {
            let term = String::from_utf8_lossy(&self.command[10..26]).into_owned();
            info!(
                "received Search for {:?} from {}, start {}",
                term.trim(),
                source.trim(),
                start
            );
            self.start = start;
            self.search = term;
            self.pending = Pending::Search;
            self.reply_due = Some(self.now + REPLY_DELAY_MS);
        } else {
            debug!("unknown All request mode {mode:02x?}");
        }
    }

    fn process_category(&mut self, source: &str) {
        info!("received Category request from {}", source.trim());
        self.start = 0;
        self.pending = Pending::Category;
        self.reply_due = Some(self.now + REPLY_DELAY_MS);
    }

    /// Drive timers and the paced transmitter.
    ///
    /// `now_ms` is any monotonic millisecond reading; it only has to
    /// be consistent between calls. At most one frame is handed to
    /// the sink per elapsed pacing interval, and a sink failure drops
    /// that frame rather than stalling the queue.
    pub fn clock(&mut self, now_ms: u64) {
        self.now = now_ms;

        if let Some(due) = self.reply_due
            && now_ms >= due
        {
            self.reply_due = None;
            let reply = match self.pending {
                Pending::Dx => Some(self.build_dx_reply()),
                Pending::All | Pending::Category => Some(self.build_all_reply()),
                Pending::Search => Some(self.build_search_reply()),
                Pending::None | Pending::Connect | Pending::Disconnect => None,
            };
            self.pending = Pending::None;
            if let Some(reply) = reply {
                info!("queued {} byte WiresX reply", reply.len());
                self.queue_reply(reply);
            }
        }

        if now_ms.saturating_sub(self.last_tx) >= TX_INTERVAL_MS
            && let Some(frame) = self.queue.pop_front()
        {
            if let Err(e) = self.sink.write(&frame) {
                warn!("dropping {} byte WiresX frame: {e}", frame.len());
            }
            // Advance either way so a broken sink cannot turn the
            // pacer into a tight retry loop.
            self.last_tx = now_ms;
        }
    }

    /// Queue the reply confirming a link to `dst_id`.
    ///
    /// Called by the bridge once the DMR side is actually connected,
    /// not from the deferred timer.
    pub fn send_connect_reply(&mut self, dst_id: u32) {
        self.dst_id = dst_id;
        self.full_dst_id = dst_id;
        info!("queued connect reply for {dst_id}");
        let reply = self.build_connect_reply();
        self.queue_reply(reply);
    }

    /// Queue the reply confirming the link is gone.
    pub fn send_disconnect_reply(&mut self) {
        self.dst_id = 0;
        self.full_dst_id = 0;
        info!("queued disconnect reply");
        let reply = self.build_disconnect_reply();
        self.queue_reply(reply);
    }

    /// Terminate a space-filled reply buffer and queue it: end marker,
    /// then the additive checksum of everything before the checksum.
    fn queue_reply(&mut self, mut frame: Vec<u8>) {
        let end = frame.len() - 2;
        frame[end] = END_OF_DATA;
        frame[end + 1] = crc::checksum(&frame[..=end]);
        self.queue.push_back(frame);
        self.seq_no = self.seq_no.wrapping_add(1);
    }

    fn header(&self, frame: &mut [u8], token: &[u8; 4]) {
        frame[0] = self.seq_no;
        frame[1..5].copy_from_slice(token);
        put(&mut frame[5..10], &self.id);
        put(&mut frame[10..20], &self.node);
        put(&mut frame[20..34], &self.name);
    }

    fn destination_block(&self, frame: &mut [u8]) {
        put(&mut frame[34..36], "15");
        put(&mut frame[36..41], &last_five(self.dst_id));
        put(&mut frame[41..57], &mnemonic(self.dst_id));
        put(&mut frame[57..60], "000");
        if let Some(group) = self.registry.find_by_id(self.dst_id) {
            put(&mut frame[70..84], group.desc());
        }
    }

    fn build_dx_reply(&self) -> Vec<u8> {
        let mut frame = vec![b' '; DX_REPLY_LEN];
        self.header(&mut frame, &DX_RESP);
        if self.dst_id == 0 {
            put(&mut frame[34..36], "12");
            put(&mut frame[57..60], "000");
        } else {
            self.destination_block(&mut frame);
        }
        put(&mut frame[84..107], &self.frequency_string());
        frame
    }

    fn build_connect_reply(&self) -> Vec<u8> {
        let mut frame = vec![b' '; CONNECT_REPLY_LEN];
        self.header(&mut frame, &CONN_RESP);
        self.destination_block(&mut frame);
        frame
    }

    fn build_disconnect_reply(&self) -> Vec<u8> {
        let mut frame = vec![b' '; CONNECT_REPLY_LEN];
        self.header(&mut frame, &DISC_RESP);
        put(&mut frame[34..36], "12");
        put(&mut frame[57..60], "000");
        frame
    }

    fn list_header(&self, frame: &mut [u8], mode: &[u8; 2], count: &str) {
        frame[0] = self.seq_no;
        frame[1..5].copy_from_slice(&ALL_RESP);
        frame[5] = mode[0];
        frame[6] = mode[1];
        put(&mut frame[7..12], &self.id);
        put(&mut frame[12..22], &self.node);
        put(&mut frame[22..28], count);
        frame[28] = RECORD_SEP;
    }

    fn build_all_reply(&self) -> Vec<u8> {
        let page = self.registry.get_all(self.start, PAGE_LEN);
        let total = self.registry.len().min(999);
        let mut frame = vec![b' '; ALL_REPLY_LEN];
        self.list_header(&mut frame, b"21", &format!("{:03}{:03}", page.len(), total));
        for (i, group) in page.iter().enumerate() {
            let at = 29 + i * RECORD_LEN;
            frame[at] = b'5';
            put(&mut frame[at + 1..at + 6], &group.id()[2..]);
            put(&mut frame[at + 6..at + 22], group.name());
            put(&mut frame[at + 22..at + 25], "000");
            put(&mut frame[at + 25..at + 39], group.desc());
            frame[at + 39] = RECORD_SEP;
        }
        frame
    }

    fn build_search_reply(&self) -> Vec<u8> {
        let term = self.search.trim();
        let hits = if term.is_empty() {
            Vec::new()
        } else {
            self.registry.search(term)
        };
        if hits.is_empty() {
            return self.build_search_not_found();
        }
        let total = hits.len().min(999);
        let lo = self.start.min(hits.len());
        let hi = (self.start + PAGE_LEN).min(hits.len());
        let page = &hits[lo..hi];

        let mut frame = vec![b' '; ALL_REPLY_LEN];
        self.list_header(&mut frame, b"02", &format!("1{:02}{:03}", page.len(), total));
        for (i, group) in page.iter().enumerate() {
            let at = 29 + i * RECORD_LEN;
            frame[at] = b'1';
            put(&mut frame[at + 1..at + 6], &group.id()[2..]);
            put(&mut frame[at + 6..at + 22], &group.name().to_uppercase());
            put(&mut frame[at + 22..at + 25], "000");
            put(&mut frame[at + 25..at + 39], group.desc());
            frame[at + 39] = RECORD_SEP;
        }
        frame
    }

    fn build_search_not_found(&self) -> Vec<u8> {
        let mut frame = vec![b' '; NOT_FOUND_REPLY_LEN];
        self.list_header(&mut frame, b"01", "100000");
        frame
    }

    /// The 23 character frequency field: TX frequency, then the
    /// signed TX to RX offset.
    fn frequency_string(&self) -> String {
        let (sign, offset) = if self.rx_frequency > self.tx_frequency {
            ('+', self.rx_frequency - self.tx_frequency)
        } else {
            ('-', self.tx_frequency - self.rx_frequency)
        };
        let khz = (self.tx_frequency % 1_000_000 + 500) / 1000;
        format!(
            "{:05}.{:03}000{}{:03}.{:06}",
            self.tx_frequency / 1_000_000,
            khz,
            sign,
            offset / 1_000_000,
            offset % 1_000_000
        )
    }
}

/// Copy `src` into `dst`, truncating; `dst` keeps its padding beyond
/// the end of `src`.
fn put(dst: &mut [u8], src: &str) {
    for (d, s) in dst.iter_mut().zip(src.bytes()) {
        *d = s;
    }
}

fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

/// The last five digits of a talk-group id, as the radio displays it.
fn last_five(id: u32) -> String {
    let id = format!("{id:07}");
    id[2..].to_string()
}

/// Display name for well-known destinations.
fn mnemonic(id: u32) -> String {
    match id {
        9 => "LOCAL".to_string(),
        4000 => "UNLINK".to_string(),
        9990 => "PARROT".to_string(),
        n => format!("TG {n}"),
    }
}

fn fnv1a32(text: &str) -> u32 {
    text.bytes()
        .fold(0x811C_9DC5u32, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(16_777_619)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::VecFrameSink;

    const SOURCE: &str = "N0CALL    ";

    const DIRECTORY: &str = "\
9;0;LOCAL;LOCAL MODULE
4000;0;UNLINK;UNLINK
1234567;60;EXAMPLE NET;WIDE AREA
31;0;TEST GROUP;EUROPE
32;0;TEST ANOTHER;EUROPE
";

    fn session() -> WiresX<VecFrameSink> {
        let mut registry = Registry::new(false);
        registry.load(DIRECTORY.as_bytes()).unwrap();
        WiresX::new(
            "AB1CDE",
            "ND",
            "Test Repeater",
            430_500_000,
            439_900_000,
            registry,
            VecFrameSink::new(),
        )
    }

    /// Wrap a command body into checksummed, padded fragments and
    /// feed them through `process`.
    fn send_command(wiresx: &mut WiresX<VecFrameSink>, body: &[u8]) -> Status {
        let mut cmd = body.to_vec();
        cmd.push(END_OF_DATA);
        cmd.push(crc::checksum(&cmd));
        let total_len = if cmd.len() <= 20 {
            20
        } else {
            20 + (cmd.len() - 20).div_ceil(40) * 40
        };
        cmd.resize(total_len, b' ');
        let total = (1 + (total_len - 20) / 40) as u8;

        let mut status = wiresx.process(&cmd[..20], SOURCE, 1, 1, 1, total);
        for (i, chunk) in cmd[20..].chunks(40).enumerate() {
            status = wiresx.process(chunk, SOURCE, 1, 1, i as u8 + 2, total);
        }
        status
    }

    #[test]
    fn identity_is_derived() {
        let wiresx = session();
        assert_eq!(wiresx.callsign(), "AB1CDE    ");
        assert_eq!(wiresx.node(), "AB1CDE-ND ");
        assert_eq!(wiresx.id(), "50895");
        assert_eq!(wiresx.dst_id(), 0);
    }

    #[test]
    fn ignores_wrong_channel() {
        let mut wiresx = session();
        let payload = [0u8; 20];
        assert_eq!(wiresx.process(&payload, SOURCE, 0, 1, 1, 1), Status::None);
        assert_eq!(wiresx.process(&payload, SOURCE, 1, 2, 1, 1), Status::None);
        assert_eq!(wiresx.process(&payload, SOURCE, 1, 1, 0, 1), Status::None);
    }

    #[test]
    fn dx_reply_when_unlinked() {
        let mut wiresx = session();
        assert_eq!(send_command(&mut wiresx, &[0x01, 0x5D, 0x71, 0x5F]), Status::Dx);

        // Nothing before the deferred deadline.
        wiresx.clock(500);
        assert!(wiresx.sink().frames().is_empty());
        assert_eq!(wiresx.queued_frames(), 0);

        wiresx.clock(1000);
        let frames = wiresx.sink().frames();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.len(), 129);
        assert_eq!(frame[0], 0);
        assert_eq!(&frame[1..5], &DX_RESP);
        assert_eq!(&frame[5..10], b"50895");
        assert_eq!(&frame[10..20], b"AB1CDE-ND ");
        assert_eq!(&frame[20..34], b"Test Repeater ");
        assert_eq!(&frame[34..36], b"12");
        assert_eq!(&frame[57..60], b"000");
        assert_eq!(&frame[84..107], b"00430.500000+009.400000");
        assert_eq!(frame[127], END_OF_DATA);
        assert_eq!(frame[128], crc::checksum(&frame[..128]));
    }

    #[test]
    fn dx_reply_when_linked() {
        let mut wiresx = session();
        wiresx.send_connect_reply(1234567);
        wiresx.clock(100);
        assert_eq!(wiresx.sink().frames().len(), 1);

        send_command(&mut wiresx, &[0x01, 0x5D, 0x71, 0x5F]);
        wiresx.clock(1200);
        let frame = &wiresx.sink().frames()[1];
        assert_eq!(frame.len(), 129);
        assert_eq!(&frame[34..36], b"15");
        assert_eq!(&frame[36..41], b"34567");
        assert_eq!(&frame[41..57], b"TG 1234567      ");
        assert_eq!(&frame[70..84], b"WIDE AREA     ");
    }

    #[test]
    fn connect_round_trip() {
        let mut wiresx = session();
        let status = send_command(&mut wiresx, b"\x01\x5D\x23\x5F004000");
        assert_eq!(status, Status::Connect);
        assert_eq!(wiresx.dst_id(), 4000);
        assert_eq!(wiresx.full_dst_id(), 4000);

        wiresx.send_connect_reply(4000);
        wiresx.clock(100);
        let frame = &wiresx.sink().frames()[0];
        assert_eq!(frame.len(), 91);
        assert_eq!(&frame[1..5], &CONN_RESP);
        assert_eq!(&frame[34..36], b"15");
        assert_eq!(&frame[36..41], b"04000");
        assert_eq!(&frame[41..57], b"UNLINK          ");
        assert_eq!(frame[89], END_OF_DATA);
        assert_eq!(frame[90], crc::checksum(&frame[..90]));
    }

    #[test]
    fn connect_rejects_bad_destinations() {
        let mut wiresx = session();
        assert_eq!(
            send_command(&mut wiresx, b"\x01\x5D\x23\x5F000000"),
            Status::None
        );
        assert_eq!(
            send_command(&mut wiresx, b"\x01\x5D\x23\x5F00A000"),
            Status::None
        );
        assert_eq!(wiresx.dst_id(), 0);
    }

    #[test]
    fn disconnect_round_trip() {
        let mut wiresx = session();
        wiresx.send_connect_reply(9);
        wiresx.clock(100);

        let status = send_command(&mut wiresx, &[0x01, 0x5D, 0x2A, 0x5F]);
        assert_eq!(status, Status::Disconnect);

        wiresx.send_disconnect_reply();
        assert_eq!(wiresx.dst_id(), 0);
        wiresx.clock(200);
        let frame = &wiresx.sink().frames()[1];
        assert_eq!(frame.len(), 91);
        assert_eq!(&frame[34..36], b"12");
        assert_eq!(frame[89], END_OF_DATA);
    }

    #[test]
    fn all_request_pages_the_directory() {
        let mut wiresx = session();
        let status = send_command(&mut wiresx, b"\x01\x5D\x66\x5F 01001");
        assert_eq!(status, Status::All);
        wiresx.clock(1000);

        let frame = &wiresx.sink().frames()[0];
        assert_eq!(frame.len(), 1031);
        assert_eq!(&frame[1..5], &ALL_RESP);
        assert_eq!(frame[5], b'2');
        assert_eq!(frame[6], b'1');
        assert_eq!(&frame[7..12], b"50895");
        assert_eq!(&frame[22..28], b"005005");
        assert_eq!(frame[28], RECORD_SEP);

        // First record in load order: LOCAL.
        assert_eq!(frame[29], b'5');
        assert_eq!(&frame[30..35], b"00009");
        assert_eq!(&frame[35..51], b"LOCAL           ");
        assert_eq!(&frame[51..54], b"000");
        assert_eq!(&frame[54..68], b"LOCAL MODULE  ");
        assert_eq!(frame[68], RECORD_SEP);

        assert_eq!(frame[1029], END_OF_DATA);
        assert_eq!(frame[1030], crc::checksum(&frame[..1030]));
    }

    #[test]
    fn search_returns_sorted_hits() {
        let mut wiresx = session();
        let status = send_command(&mut wiresx, b"\x01\x5D\x66\x5F 11001TEST            ");
        assert_eq!(status, Status::All);
        wiresx.clock(1000);

        let frame = &wiresx.sink().frames()[0];
        assert_eq!(frame.len(), 1031);
        assert_eq!(frame[5], b'0');
        assert_eq!(frame[6], b'2');
        assert_eq!(&frame[22..28], b"102002");
        assert_eq!(frame[29], b'1');
        assert_eq!(&frame[35..51], b"TEST ANOTHER    ");
        assert_eq!(&frame[79 + 6..79 + 22], b"TEST GROUP      ");
    }

    #[test]
    fn search_without_hits_reports_not_found() {
        let mut wiresx = session();
        send_command(&mut wiresx, b"\x01\x5D\x66\x5F 11001ZZZZ            ");
        wiresx.clock(1000);

        let frame = &wiresx.sink().frames()[0];
        assert_eq!(frame.len(), 31);
        assert_eq!(frame[5], b'0');
        assert_eq!(frame[6], b'1');
        assert_eq!(&frame[22..28], b"100000");
        assert_eq!(frame[29], END_OF_DATA);
        assert_eq!(frame[30], crc::checksum(&frame[..30]));
    }

    #[test]
    fn category_request_lists_the_directory() {
        let mut wiresx = session();
        let status = send_command(&mut wiresx, &[0x01, 0x5D, 0x67, 0x5F]);
        assert_eq!(status, Status::None);
        wiresx.clock(1000);
        let frame = &wiresx.sink().frames()[0];
        assert_eq!(frame.len(), 1031);
        assert_eq!(frame[5], b'2');
    }

    #[test]
    fn unknown_command_fails() {
        let mut wiresx = session();
        assert_eq!(
            send_command(&mut wiresx, &[0x01, 0x5D, 0x7F, 0x5F]),
            Status::Fail
        );
    }

    #[test]
    fn bad_checksum_is_rejected_by_default() {
        let mut wiresx = session();
        let mut payload = [b' '; 20];
        payload[..4].copy_from_slice(&[0x01, 0x5D, 0x71, 0x5F]);
        payload[4] = END_OF_DATA;
        payload[5] = 0xEE; // wrong
        assert_eq!(wiresx.process(&payload, SOURCE, 1, 1, 1, 1), Status::None);

        let mut permissive = session().permissive_crc();
        assert_eq!(permissive.process(&payload, SOURCE, 1, 1, 1, 1), Status::Dx);
    }

    #[test]
    fn missing_end_marker_is_rejected() {
        let mut wiresx = session();
        let payload = [b' '; 20];
        assert_eq!(wiresx.process(&payload, SOURCE, 1, 1, 1, 1), Status::None);
    }

    #[test]
    fn later_command_replaces_pending_reply() {
        let mut wiresx = session();
        send_command(&mut wiresx, &[0x01, 0x5D, 0x71, 0x5F]);
        send_command(&mut wiresx, b"\x01\x5D\x66\x5F 01001");
        wiresx.clock(1000);
        let frames = wiresx.sink().frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 1031);
        assert_eq!(wiresx.queued_frames(), 0);
    }

    #[test]
    fn transmission_is_paced() {
        let mut wiresx = session();
        for _ in 0..14 {
            wiresx.send_connect_reply(9);
        }
        assert_eq!(wiresx.queued_frames(), 14);

        for t in (0..=1000).step_by(10) {
            wiresx.clock(t);
        }
        // One frame per 90 ms interval: 90, 180, .., 990.
        assert_eq!(wiresx.sink().frames().len(), 11);
        assert_eq!(wiresx.queued_frames(), 3);
    }

    #[test]
    fn sequence_numbers_increment() {
        let mut wiresx = session();
        wiresx.send_connect_reply(9);
        wiresx.send_connect_reply(9);
        wiresx.clock(100);
        wiresx.clock(200);
        let frames = wiresx.sink().frames();
        assert_eq!(frames[0][0], 0);
        assert_eq!(frames[1][0], 1);
    }

    #[test]
    fn sink_failure_drops_the_frame() {
        struct FailingSink;
        impl FrameSink for FailingSink {
            fn write(&mut self, frame: &[u8]) -> crate::Result<()> {
                Err(crate::Error::Sink { len: frame.len() })
            }
        }

        let mut wiresx = WiresX::new(
            "AB1CDE",
            "",
            "Test Repeater",
            430_500_000,
            430_500_000,
            Registry::new(false),
            FailingSink,
        );
        wiresx.send_connect_reply(9);
        wiresx.send_connect_reply(9);
        wiresx.clock(100);
        assert_eq!(wiresx.queued_frames(), 1);
        // The pacer moves on rather than retrying the dropped frame.
        wiresx.clock(150);
        assert_eq!(wiresx.queued_frames(), 1);
        wiresx.clock(190);
        assert_eq!(wiresx.queued_frames(), 0);
    }

    #[test]
    fn frequency_offset_sign() {
        let mut registry = Registry::new(false);
        registry.load(DIRECTORY.as_bytes()).unwrap();
        let mut wiresx = WiresX::new(
            "AB1CDE",
            "RPT",
            "Test Repeater",
            439_900_000,
            430_500_000,
            registry,
            VecFrameSink::new(),
        );
        send_command(&mut wiresx, &[0x01, 0x5D, 0x71, 0x5F]);
        wiresx.clock(1000);
        let frame = &wiresx.sink().frames()[0];
        assert_eq!(&frame[84..107], b"00439.900000-009.400000");
    }
}
