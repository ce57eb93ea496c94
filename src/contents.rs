use bitflags::bitflags;

/// Content flags carried by brush sides (through their material) and by
/// brushes (the union of their sides).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ContentFlags(u32);

bitflags! {
    impl ContentFlags : u32 {
        /// An eye is never valid in a solid.
        const Solid             = 0x00000001;
        /// Blocks visibility (for ai).
        const Opaque            = 0x00000002;
        /// Used for water.
        const Water             = 0x00000004;
        /// Solid to players.
        const PlayerClip        = 0x00000008;
        /// Solid to monsters.
        const MonsterClip       = 0x00000010;
        /// Solid to moveable entities.
        const MoveableClip      = 0x00000020;
        /// Solid to IK.
        const IkClip            = 0x00000040;
        /// Used to detect blood decals.
        const Blood             = 0x00000080;
        /// Used for actors.
        const Body              = 0x00000100;
        /// Used for projectiles.
        const Projectile        = 0x00000200;
        /// Used for dead bodies.
        const Corpse            = 0x00000400;
        /// Used for render models for collision detection.
        const RenderModel       = 0x00000800;
        /// Used for triggers.
        const Trigger           = 0x00001000;
        /// Solid for the navigation system.
        const AasSolid          = 0x00002000;
        /// Used to compile an obstacle into the navigation system.
        const AasObstacle       = 0x00004000;
        /// Used for triggers that are activated by the flashlight.
        const FlashlightTrigger = 0x00008000;
        /// Portal separating renderer areas.
        const AreaPortal        = 0x00100000;
        /// Don't cut this brush with CSG operations in the editor.
        const NoCsg             = 0x00200000;
        /// Brush only occupies leaves, it never splits the world.
        const Detail            = 0x08000000;
    }
}

/// Material and keyword names mapped to content bits, in SCREAMING_SNAKE_CASE.
pub static CONTENT_FLAG_NAMES: phf::Map<&'static str, u32> = phf::phf_map! {
    "SOLID" => ContentFlags::Solid.bits(),
    "OPAQUE" => ContentFlags::Opaque.bits(),
    "WATER" => ContentFlags::Water.bits(),
    "PLAYER_CLIP" => ContentFlags::PlayerClip.bits(),
    "MONSTER_CLIP" => ContentFlags::MonsterClip.bits(),
    "MOVEABLE_CLIP" => ContentFlags::MoveableClip.bits(),
    "IK_CLIP" => ContentFlags::IkClip.bits(),
    "BLOOD" => ContentFlags::Blood.bits(),
    "BODY" => ContentFlags::Body.bits(),
    "PROJECTILE" => ContentFlags::Projectile.bits(),
    "CORPSE" => ContentFlags::Corpse.bits(),
    "RENDER_MODEL" => ContentFlags::RenderModel.bits(),
    "TRIGGER" => ContentFlags::Trigger.bits(),
    "AAS_SOLID" => ContentFlags::AasSolid.bits(),
    "AAS_OBSTACLE" => ContentFlags::AasObstacle.bits(),
    "FLASHLIGHT_TRIGGER" => ContentFlags::FlashlightTrigger.bits(),
    "AREA_PORTAL" => ContentFlags::AreaPortal.bits(),
    "NO_CSG" => ContentFlags::NoCsg.bits(),
    "DETAIL" => ContentFlags::Detail.bits(),
};

impl ContentFlags {
    /// Resolve a single material keyword. Unknown keywords yield `None`.
    pub fn from_keyword(keyword: &str) -> Option<ContentFlags> {
        CONTENT_FLAG_NAMES.get(keyword).map(|bits| ContentFlags::from_bits_retain(*bits))
    }

    /// Combine every known name; unknown names are ignored.
    pub fn from_names<'a, I: IntoIterator<Item = &'a str>>(names: I) -> ContentFlags {
        names.into_iter().filter_map(ContentFlags::from_keyword).fold(ContentFlags::empty(), |flags, flag| flags | flag)
    }

    /// Content that blocks visibility and seals the world.
    pub fn is_opaque(&self) -> bool {
        self.intersects(ContentFlags::Solid | ContentFlags::Opaque)
    }
}
