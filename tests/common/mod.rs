#![allow(dead_code)]

/// Shoe-like model: laces at the origin, outside panels and sole to the
/// sides, and an unclassified strap below.
pub const SHOE_SCENE: &str = r#"<scene>
  <material><name>mat_laces</name><emissive>0 0 0</emissive></material>
  <material><name>mat_outside_1</name></material>
  <material><name>mat_sole</name><color>20 20 20</color></material>
  <material><name>mat_strap</name></material>
  <node>
    <name>shoe</name>
    <node>
      <name>laces_a</name>
      <material>mat_laces</material>
      <box>1 1 1</box>
    </node>
    <node>
      <name>outside_1</name>
      <material>mat_outside_1</material>
      <box>1 1 1</box>
      <position>-3 0 0</position>
    </node>
    <node>
      <name>sole_top</name>
      <material>mat_sole</material>
      <box>1 1 1</box>
      <position>3 0 0</position>
    </node>
    <node>
      <name>misc_strap</name>
      <material>mat_strap</material>
      <box>1 1 1</box>
      <position>0 -3 0</position>
    </node>
  </node>
</scene>
"#;
