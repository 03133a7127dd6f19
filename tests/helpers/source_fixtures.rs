//! Common Neva sources for tests.

/// `compA` with a single node `node1` exposing `in` and `out`.
pub const SCENARIO: &str = r#"
component Echo(in any) (out any)

component compA(start any) (stop any) {
    nodes { node1 Echo }
    net {
        :start -> node1:in
        node1:out -> :stop
    }
}
"#;

pub const FULL_PROGRAM: &str = r#"
// line and /* block */ comments
import { io  lib/strings as str }

type Pair<T> struct { first T, second T }
type Num int | float
const greeting str = 'hello'
const ratio float = 1.5

pub interface IReader<T>(sig any) (data T, err error)

#extern(print)
pub component Printer<T>(data T) (sig T)

component Handler(in any) (out any)

component Main(start any) (stop any) {
    nodes {
        printer Printer<str>
        reader IReader<int>
        #bind(greeting)
        handler Handler { log Printer<int> }
    }
    net {
        :start -> printer:data
        $greeting -> [printer:data, reader:sig]
        printer:sig -> handler:in -> :stop
        reader:data -> :stop
    }
}
"#;

/// A node whose entity has no ports at all.
pub const EMPTY_PORTS: &str = r#"
component Silent() ()

component Main() () {
    nodes { quiet Silent }
}
"#;

/// `Dup` declares `a` twice; `ok` must still be indexed.
pub const DUPLICATE_PORT: &str = r#"
component Dup(a int, a int) ()
component Fine(x int) ()

component Main() () {
    nodes {
        d Dup
        ok Fine
    }
}
"#;

/// Garbage between two components: no declaration can own it.
pub const BROKEN_BOUNDARY: &str = "component A() ()\n@@ x\ncomponent B() ()\n";
