//! Network consistency check.
//!
//! Every port address of every connection must name an existing node (or the
//! component itself) and a port in the right direction. Problems are
//! warnings; nodes that failed extraction are skipped since their error is
//! already reported.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::diagnostics::{Diagnostic, DiagnosticCollector, codes};
use super::extract::Extraction;
use crate::base::Span;
use crate::syntax::{
    Component, Connection, EntityKind, File, Interface, Port, PortAddr, Receiver, Sender,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// Data leaves through this address.
    Sending,
    /// Data arrives through this address.
    Receiving,
    /// Middle of a chain: the node both receives and sends.
    Either,
}

/// Check the networks of all components in `file`.
pub fn check_network(file: &File, extraction: &Extraction, diagnostics: &mut DiagnosticCollector) {
    for (name, component) in file.components() {
        let nodes: IndexMap<&str, &Interface> = extraction
            .components
            .get(name)
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|n| (n.path.as_str(), &n.interface))
                    .collect()
            })
            .unwrap_or_default();
        let checker = NetworkChecker {
            file,
            name,
            component,
            nodes,
        };
        for connection in &component.net {
            checker.connection(connection, Side::Sending, diagnostics);
        }
    }
}

struct NetworkChecker<'f> {
    file: &'f File,
    name: &'f SmolStr,
    component: &'f Component,
    nodes: IndexMap<&'f str, &'f Interface>,
}

impl NetworkChecker<'_> {
    fn connection(&self, conn: &Connection, sender_side: Side, diagnostics: &mut DiagnosticCollector) {
        match &conn.sender {
            Sender::PortAddr(addr) => self.port_addr(addr, sender_side, diagnostics),
            Sender::Const(reference) => {
                let is_const = self
                    .file
                    .entities
                    .get(&reference.name)
                    .is_some_and(|e| e.kind() == EntityKind::Const);
                if reference.is_local() && !is_const {
                    self.warn(
                        Span::new(conn.meta.start, conn.meta.stop),
                        format!("'${reference}' is not a constant of this file"),
                        diagnostics,
                    );
                }
            }
        }

        match &conn.receiver {
            Receiver::Ports(addrs) => {
                for addr in addrs {
                    self.port_addr(addr, Side::Receiving, diagnostics);
                }
            }
            Receiver::Chain(chained) => self.connection(chained, Side::Either, diagnostics),
        }
    }

    fn port_addr(&self, addr: &PortAddr, side: Side, diagnostics: &mut DiagnosticCollector) {
        let span = Span::new(addr.meta.start, addr.meta.stop);

        // The component's own ports: data enters through inports, leaves through outports.
        if addr.node.is_empty() {
            let io = &self.component.interface.io;
            let found = match side {
                Side::Sending => io.inports.contains_key(&addr.port),
                Side::Receiving => io.outports.contains_key(&addr.port),
                Side::Either => {
                    io.inports.contains_key(&addr.port) || io.outports.contains_key(&addr.port)
                }
            };
            if !found {
                self.warn(
                    span,
                    format!("'{}' has no port '{}'", self.name, addr.port),
                    diagnostics,
                );
            }
            return;
        }

        if !self.component.nodes.contains_key(&addr.node) {
            self.warn(
                span,
                format!("'{}' has no node '{}'", self.name, addr.node),
                diagnostics,
            );
            return;
        }
        let Some(interface) = self.nodes.get(addr.node.as_str()) else {
            return;
        };

        let io = &interface.io;
        let has = |ports: &IndexMap<SmolStr, Port>| ports.contains_key(&addr.port);
        let found = match side {
            Side::Sending => has(&io.outports),
            Side::Receiving => has(&io.inports),
            Side::Either => has(&io.inports) || has(&io.outports),
        };
        if !found {
            self.warn(
                span,
                format!("node '{}' has no port '{}'", addr.node, addr.port),
                diagnostics,
            );
        }
    }

    fn warn(&self, span: Span, message: String, diagnostics: &mut DiagnosticCollector) {
        diagnostics.add(
            Diagnostic::warning(codes::UNKNOWN_NETWORK_REF, span, message)
                .with_component(self.name.clone()),
        );
    }
}
