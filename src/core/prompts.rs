//! Instruction texts sent verbatim to the generation and vision models.

use crate::domain::model::DamageLevel;

pub const RESTORE_PROMPT: &str = "You are a highly accurate image restoration model. Your task is to remove visible damage from buildings in photographs without introducing speculative changes or fictional elements. Your restoration should be as close to realistic and historically accurate as possible, based on the undamaged parts of the structure and surrounding visual context.

Follow these principles:

Preserve all known architectural details. Reconstruct missing or damaged areas only if you can infer them confidently from visible, undamaged parts of the same building.

Do not invent new structures or features. Avoid adding decorations, signage, textures, or colors that aren't clearly present or implied in the original image.

Stay consistent with the original materials, lighting, and perspective. Use surrounding details to guide the restoration (e.g. replicate intact windows to replace broken ones).

Clean up damage only where necessary. Remove debris, scorch marks, cracks, and shattered elements, but do not alter undamaged areas.

Maintain contextual realism. Do not remove people, trees, or other non-damaged elements unless they are clearly part of the destruction.

Be conservative. When in doubt, leave ambiguous areas neutral rather than guessing.

The goal is to faithfully restore the image to what it likely looked like before the damage, without artistic reinterpretation.";

const DAMAGE_PROMPT_HEADER: &str = "You are a highly realistic architectural image manipulation model.
Your task is to artificially apply **structural and cosmetic damage** to photographs of buildings, simulating different levels of destruction.

Use the following **damage scale** as a precise guide. Render each level with appropriate realism, respecting physics and existing context. Do not invent fantasy or unnatural effects. Maintain lighting and perspective.";

pub const DAMAGE_LEVEL_MARKER: &str = "Damage level for this request:";

/// 每個等級的描述條列，與 [`DamageLevel::label`] 對應
const DAMAGE_RUBRIC: [&[&str]; 5] = [
    &[
        "Small surface cracks in walls or plaster.",
        "Slight discoloration or fading paint.",
        "Very light dirt streaks from rain or dust.",
        "No structural elements compromised, all windows intact.",
        "The building remains clearly well-maintained overall.",
    ],
    &[
        "Noticeable cracks running across sections of walls or near window edges.",
        "A few broken or missing window panes, maybe a shutter hanging loosely.",
        "Some chipped bricks, stone, or facade sections.",
        "Light debris scattered near the base (small bricks, tiles).",
        "Possibly minor buckling of metal fixtures (railings, signs).",
    ],
    &[
        "Large, deep cracks that compromise entire walls or corners.",
        "Several broken windows or window frames dislodged.",
        "Partial collapse of parapets, ledges, balconies, or roof tiles.",
        "Visible rebar or interior structure exposed in some places.",
        "Significant piles of debris near the building base.",
        "Some leaning or slight warping of the building shape.",
    ],
    &[
        "Whole sections of wall collapsed or missing.",
        "Roof partially caved in or completely gone over certain spans.",
        "Support beams visibly fractured or splintered.",
        "Large piles of rubble around the foundation.",
        "Hanging cables, torn piping, or cracked support columns.",
        "The building looks highly unstable, close to total failure.",
    ],
    &[
        "Most of the structure has collapsed into rubble.",
        "Only fragments of walls or partial frames still stand.",
        "Massive piles of bricks, steel, and broken concrete.",
        "Exposed interiors with furniture or internal walls jutting out awkwardly.",
        "Possible scorched marks, heavy dust clouds, bent metal beams twisted under the weight.",
        "The building is functionally destroyed and irreparable.",
    ],
];

fn rubric() -> String {
    DamageLevel::all()
        .zip(DAMAGE_RUBRIC)
        .map(|(level, bullets)| {
            let mut block = format!("{}. **{}:**", level, level.label());
            for bullet in bullets {
                block.push_str("\n   - ");
                block.push_str(bullet);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 破壞指令；等級只會出現在最後一行
pub fn damage_prompt(level: DamageLevel) -> String {
    format!(
        "{}\n\nDamage levels:\n\n{}\n\n{} {}",
        DAMAGE_PROMPT_HEADER,
        rubric(),
        DAMAGE_LEVEL_MARKER,
        level
    )
}

pub fn assessment_prompt() -> String {
    let scale = DamageLevel::all()
        .map(|level| format!("{} = {}", level, level.label()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a damage assessment model tasked with analyzing and comparing two images of the **same building**: the first one taken **before restoration (damaged)** and the second one **after restoration (repaired)**. Your goal is to perform a precise visual assessment of the **damage present in the 'before' image**, using the 'after' image as reference for what the undamaged state should look like.

You must:
1. Compare the **structural and cosmetic features** of the damaged image against the restored one.
2. Identify and describe the **type and extent of damage** present in the building before restoration.
3. Strictly classify the damage using this five-level scale:
{scale}
4. Return your assessment as a **JSON object** with the exact structure:
```json
{{
  \"damage_description\": \"<concise summary of the visual damage>\",
  \"damage_level\": <integer from 1 to 5>
}}
```
Return only the JSON object."
    )
}
