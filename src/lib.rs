#![warn(missing_docs)]
/*! This crate provides the control-plane core for a digital voice
gateway bridging Yaesu System Fusion (YSF) and DMR.

Two tightly coupled subsystems live here:

* The short-block FEC codecs protecting control-channel fields on
  every radio frame: Golay (20,8) and (24,12), and a family of six
  Hamming codes, plus the CRC suite used for frame trailers.
* The WiresX control-protocol engine: reassembly of multi-fragment
  command frames from the radio, command dispatch, fixed-layout reply
  generation against a talk-group directory, and paced transmission.

Everything else a gateway needs, the sockets, the vocoder, the config
surface, lives outside this crate and talks to it through plain calls
and the [`sink::FrameSink`] trait.

# Architecture overview

```text
   [ Radio fragments (fi/dt/fn/ft + payload) ]
                     ↓
        [ wiresx::WiresX::process ]
                     ↓
        [ registry::Registry query ]
                     ↓
        [ reply builder + crc trailer ]
                     ↓
   [ paced TX queue, drained by clock() ]
                     ↓
            [ sink::FrameSink ]
```

The FEC codecs sit to the side of this flow: the radio-facing frame
parser uses them to repair inbound control fields before any of the
above runs, and they are exported for that caller.

# Example

```
use ysflink::registry::Registry;
use ysflink::sink::NullFrameSink;
use ysflink::wiresx::WiresX;

let mut registry = Registry::new(false);
registry.load("1234567;0;EXAMPLE NET;WIDE AREA".as_bytes())?;
let mut wiresx = WiresX::new(
    "AB1CDE", "ND", "Test Repeater", 430_500_000, 439_900_000,
    registry, NullFrameSink,
);
wiresx.clock(0);
# Ok::<(), ysflink::Error>(())
```

The caller owns time: `clock()` takes a monotonic millisecond reading
and should be driven on roughly a 10 ms cadence.
 */

pub mod bits;
pub mod crc;
pub mod golay20;
pub mod golay24;
pub mod hamming;
pub mod registry;
pub mod sink;
pub mod wiresx;

/// Errors surfaced by gateway core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Reading a talk-group file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The network sink refused a frame.
    #[error("sink rejected a {len} byte frame")]
    Sink {
        /// Length of the rejected frame.
        len: usize,
    },
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
