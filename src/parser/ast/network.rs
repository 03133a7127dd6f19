//! Component bodies: nodes, dependency nodes and the network.

use super::*;

ast_node!(ComponentBody, COMPONENT_BODY);
ast_node!(NodesBlock, NODES_BLOCK);
ast_node!(Node, NODE);
ast_node!(NodeDeps, NODE_DEPS);
ast_node!(NetBlock, NET_BLOCK);
ast_node!(Connection, CONNECTION);
ast_node!(Sender, SENDER);
ast_node!(Receiver, RECEIVER);
ast_node!(PortAddr, PORT_ADDR);
ast_node!(ConstRef, CONST_REF);

impl ComponentBody {
    children_method!(nodes_blocks, NodesBlock);
    children_method!(net_blocks, NetBlock);

    /// All nodes of all `nodes` blocks, in source order.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.nodes_blocks()
            .flat_map(|block| block.nodes().collect::<Vec<_>>())
    }

    /// All connections of all `net` blocks, in source order.
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.net_blocks()
            .flat_map(|block| block.connections().collect::<Vec<_>>())
    }
}

impl NodesBlock {
    children_method!(nodes, Node);
}

impl Node {
    first_child_method!(name, Name);
    first_child_method!(entity_ref, EntityRef);
    first_child_method!(type_args, TypeArgs);
    first_child_method!(deps, NodeDeps);
    children_method!(directives, Directive);
}

impl NodeDeps {
    children_method!(nodes, Node);
}

impl NetBlock {
    children_method!(connections, Connection);
}

impl Connection {
    first_child_method!(sender, Sender);
    first_child_method!(receiver, Receiver);
}

impl Sender {
    first_child_method!(port_addr, PortAddr);
    first_child_method!(const_ref, ConstRef);
}

impl Receiver {
    children_method!(port_addrs, PortAddr);
    first_child_method!(connection, Connection);
}

impl PortAddr {
    /// Node name; `None` for addresses of the component itself (`:start`).
    pub fn node(&self) -> Option<String> {
        let mut tokens = significant_tokens(&self.0);
        match tokens.next() {
            Some(t) if t.kind() == SyntaxKind::IDENT => Some(t.text().to_string()),
            _ => None,
        }
    }

    /// Port name (the identifier after `:`).
    pub fn port(&self) -> Option<String> {
        significant_tokens(&self.0)
            .skip_while(|t| t.kind() != SyntaxKind::COLON)
            .find(|t| t.kind() == SyntaxKind::IDENT)
            .map(|t| t.text().to_string())
    }

    /// Array slot literal (`[0]`), unchecked.
    pub fn index(&self) -> Option<SyntaxToken> {
        significant_tokens(&self.0).find(|t| t.kind() == SyntaxKind::INTEGER)
    }
}

impl ConstRef {
    first_child_method!(entity_ref, EntityRef);
}
