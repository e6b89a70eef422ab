//! Minimal rtnetlink request/response transport
//!
//! Messages are built and parsed by hand; the wire format is the fixed
//! 16-byte `nlmsghdr`, an optional family header, and a run of 4-byte
//! aligned route attributes.

use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use nix::sys::socket::{
    AddressFamily, MsgFlags, NetlinkAddr, SockFlag, SockProtocol, SockType, bind, recv, send,
    setsockopt, socket, sockopt,
};
use nix::sys::time::{TimeVal, TimeValLike};
use tracing::debug;

use nsrun_core::{Error, Result};

/// Fixed netlink header length.
pub const NLMSG_HDRLEN: usize = 16;

/// `NLMSG_ERROR` message type.
pub const NLMSG_ERROR: u16 = 2;

/// How long a reply is waited for before the request is written off.
///
/// The probe's whole purpose is graceful capability detection, so a silent
/// kernel is treated the same as an unsupportive one.
pub const REPLY_TIMEOUT_MS: i64 = 300;

const fn align4(len: usize) -> usize {
    (len + 3) & !3
}

/// Builder for one netlink request carrying a `rtgenmsg` family header.
#[derive(Debug)]
pub struct NlRequest {
    buf: Vec<u8>,
}

impl NlRequest {
    /// Start a request of the given message type and flags.
    #[must_use]
    pub fn new(msg_type: u16, flags: u16, seq: u32) -> Self {
        let mut buf = Vec::with_capacity(64);

        // nlmsghdr: len (patched in finish), type, flags, seq, pid
        buf.extend_from_slice(&0u32.to_ne_bytes());
        buf.extend_from_slice(&msg_type.to_ne_bytes());
        buf.extend_from_slice(&flags.to_ne_bytes());
        buf.extend_from_slice(&seq.to_ne_bytes());
        buf.extend_from_slice(&0u32.to_ne_bytes());

        // rtgenmsg: one family byte, padded to the 4-byte boundary
        buf.push(libc::AF_UNSPEC as u8);
        buf.extend_from_slice(&[0u8; 3]);

        Self { buf }
    }

    /// Append a u32 route attribute.
    pub fn push_attr_u32(&mut self, kind: u16, value: u32) {
        // rta_len covers the 4-byte attribute header plus the payload
        self.buf.extend_from_slice(&8u16.to_ne_bytes());
        self.buf.extend_from_slice(&kind.to_ne_bytes());
        self.buf.extend_from_slice(&value.to_ne_bytes());
    }

    /// Patch the total length and yield the wire bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        let len = u32::try_from(self.buf.len()).unwrap_or(0);
        self.buf[..4].copy_from_slice(&len.to_ne_bytes());
        self.buf
    }
}

/// One parsed message out of a reply datagram.
#[derive(Debug, Clone, Copy)]
pub struct NlMessage<'a> {
    /// `nlmsg_type`
    pub msg_type: u16,
    /// `nlmsg_seq`
    pub seq: u32,
    /// Bytes following the header, up to `nlmsg_len`.
    pub payload: &'a [u8],
}

impl NlMessage<'_> {
    /// For `NLMSG_ERROR` messages, the (negative) kernel error code.
    #[must_use]
    pub fn error_code(&self) -> Option<i32> {
        if self.msg_type != NLMSG_ERROR || self.payload.len() < 4 {
            return None;
        }
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.payload[..4]);
        Some(i32::from_ne_bytes(raw))
    }

    /// Iterate the route attributes, skipping `header_len` bytes of
    /// fixed family header first.
    #[must_use]
    pub fn attrs(&self, header_len: usize) -> AttrIter<'_> {
        AttrIter {
            buf: self.payload.get(align4(header_len)..).unwrap_or(&[]),
        }
    }
}

/// Iterator over (type, payload) route attributes.
#[derive(Debug)]
pub struct AttrIter<'a> {
    buf: &'a [u8],
}

impl<'a> Iterator for AttrIter<'a> {
    type Item = (u16, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.len() < 4 {
            return None;
        }
        let rta_len = u16::from_ne_bytes([self.buf[0], self.buf[1]]) as usize;
        let rta_type = u16::from_ne_bytes([self.buf[2], self.buf[3]]);
        if rta_len < 4 || rta_len > self.buf.len() {
            return None;
        }
        let payload = &self.buf[4..rta_len];
        self.buf = self.buf.get(align4(rta_len)..).unwrap_or(&[]);
        Some((rta_type, payload))
    }
}

/// Split a reply datagram into its messages.
pub fn messages(buf: &[u8]) -> MessageIter<'_> {
    MessageIter { buf }
}

/// Iterator over the messages of one datagram.
#[derive(Debug)]
pub struct MessageIter<'a> {
    buf: &'a [u8],
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = NlMessage<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.len() < NLMSG_HDRLEN {
            return None;
        }
        let len = u32::from_ne_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len < NLMSG_HDRLEN || len > self.buf.len() {
            return None;
        }
        let msg_type = u16::from_ne_bytes([self.buf[4], self.buf[5]]);
        let seq = u32::from_ne_bytes([self.buf[8], self.buf[9], self.buf[10], self.buf[11]]);
        let payload = &self.buf[NLMSG_HDRLEN..len];
        self.buf = self.buf.get(align4(len)..).unwrap_or(&[]);
        Some(NlMessage {
            msg_type,
            seq,
            payload,
        })
    }
}

/// One `NETLINK_ROUTE` socket with request/response framing.
///
/// Single-owner: the socket is not designed for concurrent use. Replies are
/// waited for at most [`REPLY_TIMEOUT_MS`].
#[derive(Debug)]
pub struct RtnlSocket {
    fd: OwnedFd,
    seq: u32,
}

impl RtnlSocket {
    /// Open and bind a route-netlink socket.
    ///
    /// # Errors
    /// Returns `Error::Netlink` if the socket cannot be created or bound.
    pub fn open() -> Result<Self> {
        let fd = socket(
            AddressFamily::Netlink,
            SockType::Raw,
            SockFlag::SOCK_CLOEXEC,
            SockProtocol::NetlinkRoute,
        )
        .map_err(|e| Error::Netlink {
            message: format!("cannot open rtnetlink socket: {e}"),
        })?;

        setsockopt(
            &fd,
            sockopt::ReceiveTimeout,
            &TimeVal::milliseconds(REPLY_TIMEOUT_MS),
        )
        .map_err(|e| Error::Netlink {
            message: format!("cannot set rtnetlink receive timeout: {e}"),
        })?;

        bind(fd.as_raw_fd(), &NetlinkAddr::new(0, 0)).map_err(|e| Error::Netlink {
            message: format!("cannot bind rtnetlink socket: {e}"),
        })?;

        debug!(fd = fd.as_raw_fd(), "rtnetlink socket open");

        Ok(Self { fd, seq: 0 })
    }

    /// Next request sequence number.
    pub fn next_seq(&mut self) -> u32 {
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }

    /// Send one request datagram.
    ///
    /// # Errors
    /// Returns `Error::Netlink` carrying the OS error text.
    pub fn send(&self, buf: &[u8]) -> Result<()> {
        send(self.fd.as_raw_fd(), buf, MsgFlags::empty()).map_err(|e| Error::Netlink {
            message: format!("rtnl_send: {e}"),
        })?;
        Ok(())
    }

    /// Receive one reply datagram into `buf`, returning the filled length.
    ///
    /// # Errors
    /// Returns `Error::Netlink` on receive failure, including the bounded
    /// wait elapsing (`EAGAIN`).
    pub fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        recv(self.fd.as_raw_fd(), buf, MsgFlags::empty()).map_err(|e| Error::Netlink {
            message: format!("rtnl_recv: {e}"),
        })
    }

    /// Send a request and collect the single reply datagram.
    ///
    /// # Errors
    /// Propagates send/receive failures.
    pub fn request(&mut self, req: NlRequest) -> Result<Vec<u8>> {
        self.send(&req.finish())?;
        let mut buf = vec![0u8; 8192];
        let n = self.recv(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}

impl AsFd for RtnlSocket {
    fn as_fd(&self) -> std::os::fd::BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_layout() {
        let mut req = NlRequest::new(90, libc::NLM_F_REQUEST as u16, 7);
        req.push_attr_u32(3, 42);
        let wire = req.finish();

        // 16 header + 4 rtgenmsg + 8 attribute
        assert_eq!(wire.len(), 28);
        assert_eq!(u32::from_ne_bytes(wire[0..4].try_into().unwrap()), 28);
        assert_eq!(u16::from_ne_bytes(wire[4..6].try_into().unwrap()), 90);
        assert_eq!(
            u16::from_ne_bytes(wire[6..8].try_into().unwrap()),
            libc::NLM_F_REQUEST as u16
        );
        assert_eq!(u32::from_ne_bytes(wire[8..12].try_into().unwrap()), 7);
        // rtgenmsg family byte
        assert_eq!(wire[16], libc::AF_UNSPEC as u8);
        // attribute header and payload
        assert_eq!(u16::from_ne_bytes(wire[20..22].try_into().unwrap()), 8);
        assert_eq!(u16::from_ne_bytes(wire[22..24].try_into().unwrap()), 3);
        assert_eq!(u32::from_ne_bytes(wire[24..28].try_into().unwrap()), 42);
    }

    fn error_reply(code: i32, seq: u32) -> Vec<u8> {
        // NLMSG_ERROR payload: i32 error code + echoed request header
        let mut buf = Vec::new();
        buf.extend_from_slice(&36u32.to_ne_bytes());
        buf.extend_from_slice(&NLMSG_ERROR.to_ne_bytes());
        buf.extend_from_slice(&0u16.to_ne_bytes());
        buf.extend_from_slice(&seq.to_ne_bytes());
        buf.extend_from_slice(&0u32.to_ne_bytes());
        buf.extend_from_slice(&code.to_ne_bytes());
        buf.extend_from_slice(&[0u8; 16]);
        buf
    }

    #[test]
    fn test_parse_error_message() {
        let wire = error_reply(-libc::EOPNOTSUPP, 3);
        let msgs: Vec<_> = messages(&wire).collect();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].msg_type, NLMSG_ERROR);
        assert_eq!(msgs[0].seq, 3);
        assert_eq!(msgs[0].error_code(), Some(-libc::EOPNOTSUPP));
    }

    #[test]
    fn test_error_code_absent_on_other_types() {
        let mut req = NlRequest::new(88, 0, 1);
        req.push_attr_u32(1, 9);
        let wire = req.finish();
        let msg = messages(&wire).next().unwrap();
        assert_eq!(msg.error_code(), None);
    }

    #[test]
    fn test_attr_iteration() {
        let mut req = NlRequest::new(88, 0, 1);
        req.push_attr_u32(1, 0x0102_0304);
        req.push_attr_u32(3, 5);
        let wire = req.finish();

        let msg = messages(&wire).next().unwrap();
        let attrs: Vec<_> = msg.attrs(1).collect();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].0, 1);
        assert_eq!(attrs[0].1, &0x0102_0304u32.to_ne_bytes()[..]);
        assert_eq!(attrs[1].0, 3);
    }

    #[test]
    fn test_truncated_datagram_stops_iteration() {
        let wire = error_reply(-libc::EINVAL, 1);
        let msgs: Vec<_> = messages(&wire[..10]).collect();
        assert!(msgs.is_empty());
    }
}
