// 해설 문구 풀 + 라인 생성
use rand::Rng;

use super::config::Phase;
use super::outcome::{format_margin, Verdict};
use crate::models::{CommentaryKind, CommentaryLine, RandomEventKind, RecentLines};

/// `{a}` is replaced by one of the two competitors.
const EARLY_LINES: &[&str] = &[
    "{a}, 우상귀 소목에 첫 수를 둡니다.",
    "{a}의 화점 포석, 실리보다 세력을 택했네요.",
    "{a}, 걸침에 곧바로 협공으로 응수합니다.",
    "정석대로 진행되고 있습니다. 아직은 탐색전이죠.",
    "{a}, 변에 벌려 두며 차분하게 자리를 잡습니다.",
    "양측 모두 빠른 손길로 포석을 펼칩니다.",
    "{a}의 삼연성, 중앙을 크게 노리는 구상입니다.",
    "{a}, 날일자 굳힘으로 귀를 단단히 지킵니다.",
];

const MID_LINES: &[&str] = &[
    "{a}, 상대 진영 깊숙이 침입합니다!",
    "중앙에서 치열한 수싸움이 벌어지고 있습니다.",
    "{a}, 끊어 가는 강수! 전투가 시작됩니다.",
    "{a}의 돌들이 조금 엷어 보이는데요.",
    "패가 났습니다. 팻감 싸움이 중요해졌어요.",
    "{a}, 대마를 몰아붙이며 공세를 이어갑니다.",
    "{a}, 두터움을 바탕으로 천천히 압박합니다.",
    "형세가 미묘합니다. 한 수 한 수가 무겁네요.",
    "{a}, 사활을 건 수읽기에 들어갑니다.",
];

const END_LINES: &[&str] = &[
    "끝내기 단계에 들어섰습니다.",
    "{a}, 선수 끝내기를 놓치지 않습니다.",
    "{a}, 큰 곳부터 차례로 챙겨 갑니다.",
    "계가를 해 보면 아직 알 수 없는 차이입니다.",
    "{a}, 초읽기에 몰리고 있습니다.",
    "{a}의 침착한 마무리가 돋보입니다.",
    "반집 승부로 흘러가는 분위기네요.",
    "{a}, 마지막 공배를 메웁니다.",
];

fn pool(phase: Phase) -> (&'static [&'static str], u16) {
    match phase {
        Phase::Early => (EARLY_LINES, 0),
        Phase::Mid => (MID_LINES, 100),
        Phase::End => (END_LINES, 200),
    }
}

/// Pick a flavor line for `phase`, skipping the recently used ones when the
/// pool is large enough. Records the pick in `recent`.
pub fn pick_flavor(
    phase: Phase,
    names: [&str; 2],
    recent: &mut RecentLines,
    rng: &mut impl Rng,
) -> String {
    let (lines, base) = pool(phase);
    let fresh: Vec<usize> =
        (0..lines.len()).filter(|i| !recent.contains(base + *i as u16)).collect();
    let idx = if fresh.is_empty() {
        rng.gen_range(0..lines.len())
    } else {
        fresh[rng.gen_range(0..fresh.len())]
    };
    recent.push(base + idx as u16);
    let actor = names[rng.gen_range(0..2)];
    lines[idx].replace("{a}", actor)
}

pub fn opening_line(round_name: &str, names: [&str; 2]) -> CommentaryLine {
    CommentaryLine::new(
        1,
        CommentaryKind::Opening,
        format!("[{}] {} 대 {}, 대국을 시작합니다!", round_name, names[0], names[1]),
    )
}

pub fn lead_line(tick: u32, leader: &str, lead: f64) -> CommentaryLine {
    CommentaryLine::new(
        tick,
        CommentaryKind::Lead,
        format!("{}수째, {}이(가) 약 {}집 앞서 있습니다.", tick, leader, lead as i64),
    )
}

pub fn event_line(tick: u32, event: RandomEventKind, actor: &str, swing_percent: f64) -> CommentaryLine {
    let body = match event {
        RandomEventKind::ConcentrationLapse => format!("{}, 집중력이 흐트러지며 실착이 나옵니다!", actor),
        RandomEventKind::FastThinking => format!("{}, 번뜩이는 묘수로 위기를 넘깁니다!", actor),
        RandomEventKind::AggressivePush => format!("{}, 과감한 강공으로 판을 흔듭니다!", actor),
        RandomEventKind::StabilityHold => format!("{}, 흔들림 없이 침착하게 버텨 냅니다!", actor),
    };
    let sign = if event.is_positive() { '+' } else { '-' };
    CommentaryLine::event(tick, event, format!("{} (형세 {}{:.1}%)", body, sign, swing_percent))
}

pub fn flavor_line(tick: u32, text: String) -> CommentaryLine {
    CommentaryLine::new(tick, CommentaryKind::Flavor, text)
}

/// Final score line + victory line
pub fn closing_lines(tick: u32, names: [&str; 2], verdict: &Verdict) -> Vec<CommentaryLine> {
    let winner = names[verdict.winner_slot];
    vec![
        CommentaryLine::new(
            tick,
            CommentaryKind::FinalScore,
            format!(
                "최종 형세: {} {:.1}% - {:.1}% {}",
                names[0], verdict.percent[0], verdict.percent[1], names[1]
            ),
        ),
        CommentaryLine::new(
            tick,
            CommentaryKind::Victory,
            format!("{} {} 승! 축하합니다!", winner, format_margin(verdict.margin)),
        ),
    ]
}

pub fn forfeit_line(tick: u32, forfeiter: &str, winner: Option<&str>) -> CommentaryLine {
    let text = match winner {
        Some(w) => format!("{}의 기권으로 {}이(가) 승리합니다.", forfeiter, w),
        None => format!("{}, 기권했습니다.", forfeiter),
    };
    CommentaryLine::new(tick, CommentaryKind::Forfeit, text)
}
