/// Data layer: core types, mesh input, table building and table I/O.
///
/// Architecture:
/// ```text
///  case.vtu + case.pins
///        │
///        ▼
///   ┌──────────┐
///   │   mesh    │  VTU → MeshData (points, triangles, point arrays)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  extract  │  electron_density[_N] arrays, ordered by step
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   table   │  pair with Pins → PointValueRow + FieldStatsRow
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  CSV in/out, Pin lists   ·   filter: table selections
///   └──────────┘
/// ```

pub mod extract;
pub mod filter;
pub mod loader;
pub mod mesh;
pub mod model;
pub mod table;
