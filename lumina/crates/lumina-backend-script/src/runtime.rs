//! The fixed set of runtime-helper names built-in macros and derives lower
//! to (spec §4.8). The emitter only ever calls these by name; it never
//! invents a new helper.

pub const EQ: &str = "__lumina_eq";
pub const CLONE: &str = "__lumina_clone";
pub const STRINGIFY: &str = "__lumina_stringify";
pub const TRY: &str = "__lumina_try";
pub const RANGE: &str = "__lumina_range";
pub const SLICE: &str = "__lumina_slice";
pub const ARRAY_BOUNDS_CHECK: &str = "__lumina_array_bounds_check";

/// Every emitted program embeds a small prelude defining these helpers in
/// terms of the host scripting runtime (dynamic equality, structural clone,
/// `toString`-style stringification, and so on), so a program is runnable
/// standalone without a bundled library.
pub fn prelude() -> &'static str {
    concat!(
        "function __lumina_eq(a, b) {\n",
        "  if (Array.isArray(a) && Array.isArray(b)) {\n",
        "    return a.length === b.length && a.every((v, i) => __lumina_eq(v, b[i]));\n",
        "  }\n",
        "  if (a && b && typeof a === 'object' && typeof b === 'object') {\n",
        "    const ak = Object.keys(a), bk = Object.keys(b);\n",
        "    return ak.length === bk.length && ak.every((k) => __lumina_eq(a[k], b[k]));\n",
        "  }\n",
        "  return a === b;\n",
        "}\n",
        "function __lumina_clone(v) {\n",
        "  if (Array.isArray(v)) return v.map(__lumina_clone);\n",
        "  if (v && typeof v === 'object') return Object.assign({}, v);\n",
        "  return v;\n",
        "}\n",
        "function __lumina_stringify(v) {\n",
        "  return (v === undefined || v === null) ? 'unit' : String(v);\n",
        "}\n",
        "function __lumina_try(v) {\n",
        "  if (v && typeof v === 'object' && '__tag' in v && v.__tag === 1) throw v;\n",
        "  return v;\n",
        "}\n",
        "function __lumina_range(start, end) {\n",
        "  const out = [];\n",
        "  for (let i = start; i < end; i++) out.push(i);\n",
        "  return out;\n",
        "}\n",
        "function __lumina_slice(arr, start, end) {\n",
        "  return arr.slice(start, end);\n",
        "}\n",
        "function __lumina_array_bounds_check(arr, index) {\n",
        "  if (index < 0 || index >= arr.length) throw new RangeError('index out of bounds');\n",
        "  return index;\n",
        "}\n",
    )
}
