/*!

This is the long-form manual for `survey_reconcile` and `guidemerge`.

## File names

Guides and data files are matched by category: the token between the last two
underscores of the file name, without extension.

* guides: `.xlsx` files of the guide directory (subdirectories are not searched).
  `KPC_NCSI_Hospital_guide.xlsx` is the guide of `Hospital`. When two guides
  name the same category, the last one in alphabetical order is used.
* data files: `.csv`, `.xlsx` and `.xls` files of the input directory and its
  subdirectories. The first two characters are the year:
  `24_Hospital_raw.csv` holds the 2024 data of `Hospital`. Only the configured
  years are merged.

Files starting with `~$` (left by spreadsheet programs) are always ignored.

## Guide format

The first worksheet of a guide is read with its first row as header.

|   | ... | 변수레이블 | ... | required | ... | required | ... | derived | ... | derived |
|---|-----|-----------|-----|----------|-----|----------|-----|---------|-----|---------|
|   |     | Q1        |     | LV1      |     |          |     | xLV1    |     |         |
|   |     | Q2        |     |          |     | LV2      |     | xLV1    |     |         |

* The variable label column (`변수레이블` by default) lists the variables of
  the merged dataset, in order.
* The required code columns (positions 4 and 6 by default, counting from 0)
  hold the codes that the data files must provide. Any other text found there
  is also required as a column name.
* The derived code columns (positions 8 and 10 by default) hold the `xLV`
  codes. They must not be present in the data files: each one is computed as
  the mean of the variables it is written next to. In the example above,
  `xLV1` is the row-wise mean of `Q1` and `Q2`, over the values present.

Codes are `LV` or `xLV` followed by digits, in any case and with any
surrounding spaces: `lv3`, ` Lv3 ` and `LV3` are the same code. Other names
are only trimmed.

## Merge

For each category:

1. The columns of all the data files are checked against the guide. A
   missing required code, or a derived code already present, stops the
   category.
2. The data files are stacked, oldest year first. Columns missing from a file
   are left blank.
3. The derived codes are computed.
4. Columns spelling the same code differently are merged: the leftmost column
   wins, the others only fill its blanks.
5. Only the guide variables and the guide codes are kept.
6. The guide variables are written in guide order, each code right before
   the first variable it is linked to. Codes not linked to any variable present
   come last.

A category that fails is reported and the other categories are still merged.

## Configuration

`guidemerge` accepts a configuration file in JSON with the `--config` option.
All the entries are optional, and the command line options take precedence.

```text
{
  "inputDirectory": "data",
  "guideDirectory": "guides",
  "outputDirectory": "result",
  "targetYears": ["24", "23", "22"],
  "variableLabelColumn": "변수레이블",
  "requiredCodeColumns": [4, 6],
  "forbiddenCodeColumns": [8, 10],
  "outputFileName": "KPC_NCSI_{category}_DATA.xlsx",
  "qaRequiredColumns": ["id", "year", "sector", "industry", "firm", "firm1", "area", "gender", "age", "age1"]
}
```

Relative directories are resolved against the directory of the configuration
file. The three directories must be given, either in the file or on the
command line.

## QA

With `--qa`, every `.xlsx` file of the output directory is checked once the
merge is done: each QA column must be present (names compared trimmed and
lower-cased) and hold at least one value.

## Summary

A JSON summary is written to the standard output, or to the file given with
`--summary-out`:

```text
{
  "attempted": ["Bank", "Hospital"],
  "succeeded": [
    {"category": "Hospital", "output": "result/KPC_NCSI_Hospital_DATA.xlsx",
     "rows": 1200, "columns": 85, "skippedFiles": []}
  ],
  "failed": [
    {"category": "Bank", "reason": "required variables missing",
     "detail": "required variables missing: {\"LV7\"}"}
  ],
  "skippedInputs": 3
}
```

The possible reasons are `guide load failure`, `column read failure`,
`required variables missing`, `forbidden variables present`,
`data load failure`, `concat failure`, `reconcile failure` and `save failure`.

 */
