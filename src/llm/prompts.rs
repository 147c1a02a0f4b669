//! Prompt text for the consolidation call and the analyst chat.

use crate::error::Result;
use crate::schema::RecordWireFormat;

pub const SYSTEM_PROMPT_CONSOLIDATION: &str = r#"
You are a CFO creating a consolidated financial report.

## GOAL
Merge the data from every provided file into a single structured table.

## STATEMENT CLASSIFICATION
Classify each row into exactly one statement code:
- 'BS'    Balance Sheet
- 'IS'    Income Statement
- 'COGM'  Cost of Goods Manufactured
- 'CF'    Cash Flow Statement
- 'SCE'   Statement of Changes in Equity
- 'RE'    Statement of Retained Earnings
- 'Other' anything else

## HIERARCHY LEVEL
Assign a 'Level' used for formatting:
- Level 1: totals and major lines (e.g. 자산총계, 매출액)
- Level 2: subtotals (e.g. 유동자산, 영업이익)
- Level 3: details (e.g. 현금, 접대비)

## PERIOD COLUMNS (CRUCIAL)
- Detect ALL time periods and emit each one as its own key.
- Quarters are valid columns: '2025.3Q' or '2024.1Q' are treated just like '2024'.
- Keep three-month and cumulative figures apart, e.g. '2025.3Q(3M)' and '2025.3Q(Cum)'.
- Never drop a time-related column.

## MERGING
- Preserve the logical accounting order (Assets -> Liabilities -> Equity, Revenue -> Expenses).
  Do NOT sort alphabetically.
- Treat synonymous account names across files as the same account.
- Interleave accounts that only appear in some files at their natural position.
- Amounts are plain numbers in the source currency unit. Do not rescale.
"#;

const OUTPUT_EXAMPLE: &str = r#"[
  {
    "Statement": "BS",
    "Level": 1,
    "Account_Name": "자산총계",
    "2024": 10000,
    "2025.3Q": 12000
  }
]"#;

/// Full consolidation prompt around the flattened document `context`.
pub fn consolidation_prompt(context: &str) -> Result<String> {
    let schema = RecordWireFormat::schema_as_json()?;
    Ok(format!(
        "{}\n## INPUT DATA\n{}\n\n## OUTPUT FORMAT\nJSON array only. Each element follows this schema:\n{}\n\nExample:\n{}\n",
        SYSTEM_PROMPT_CONSOLIDATION.trim_start(),
        context,
        schema,
        OUTPUT_EXAMPLE
    ))
}

/// Analyst prompt: the displayed data as CSV, its unit, and the user's question.
pub fn analyst_prompt(data_csv: &str, unit_label: &str, question: &str) -> String {
    format!(
        r#"당신은 유능한 재무 분석가입니다.
사용자는 아래의 재무제표 데이터(CSV 포맷, 단위: {unit})를 보고 있습니다.
사용자의 질문에 대해 데이터를 기반으로 명확하고 통찰력 있게 답변하세요.

[데이터]
{data}

[답변 가이드]
- 구체적인 수치를 인용하세요.
- 추세나 특이사항이 있다면 언급하세요.

[사용자 질문]: {question}"#,
        unit = unit_label,
        data = data_csv.trim_end(),
        question = question.trim()
    )
}
