//! Platform-provided module names.
//!
//! Builtins resolve without a dependency declaration and are never
//! recompiled to dew form. Names are stored without the `node:` prefix and
//! without subpaths. The empty module and its compiled name count as
//! builtins.

/// Builtin module registry.
pub const BUILTINS: &[&str] = &[
    "@empty",
    "@empty.dew",
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "worker_threads",
    "zlib",
];

/// Check whether `name` is a builtin module name.
#[must_use]
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}
