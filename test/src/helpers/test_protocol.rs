use choreo_shared::{
    EffectKind, EffectTemplate, EffectronTemplate, PhraseTemplate, Protocol, SelectronTemplate,
};

/// Two second flash attached to the extra object, joinable late
pub const SPARK: &str = "spark";
/// Three one second loops of a short sound
pub const PULSE: &str = "pulse";
/// Endless flame on the scene object `Tower`
pub const TORCH: &str = "torch";
/// Selection highlight for objects of type bit 0
pub const BEACON: &str = "beacon";

pub const BEACON_TYPE_MASK: u32 = 0b1;

pub fn test_protocol() -> Protocol {
    Protocol::builder()
        .add_effectron(
            EffectronTemplate::new(
                SPARK,
                PhraseTemplate::new(vec![EffectTemplate::new(EffectKind::Billboard)
                    .named("spark_glow")
                    .constrained_to("extra")
                    .with_fades(0.0, 0.5)])
                .with_duration(2.0),
            )
            .with_exec_on_new_clients(true),
        )
        .add_effectron(EffectronTemplate::new(
            PULSE,
            PhraseTemplate::new(vec![
                EffectTemplate::new(EffectKind::Sound).with_lifetime(0.5)
            ])
            .with_duration(1.0)
            .with_loops(3),
        ))
        .add_effectron(
            EffectronTemplate::new(
                TORCH,
                PhraseTemplate::new(vec![EffectTemplate::new(EffectKind::Billboard)
                    .named("torch_flame")
                    .constrained_to("scene:Tower")
                    .with_life_constraint()
                    .with_fades(0.25, 0.25)]),
            )
            .with_exec_on_new_clients(true),
        )
        .add_selectron(
            SelectronTemplate::new(BEACON, BEACON_TYPE_MASK, 0)
                .with_main(PhraseTemplate::new(vec![
                    EffectTemplate::new(EffectKind::Light).constrained_to("selected")
                ]))
                .with_select(
                    PhraseTemplate::new(vec![
                        EffectTemplate::new(EffectKind::Sound).with_lifetime(0.25)
                    ])
                    .with_duration(0.5),
                )
                .with_deselect(
                    PhraseTemplate::new(vec![
                        EffectTemplate::new(EffectKind::Sound).with_lifetime(0.25)
                    ])
                    .with_duration(0.5),
                ),
        )
        .build()
}
